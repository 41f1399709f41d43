use super::{parse_json, print_json, with_store};
use clap::Args;
use relstore_postgres::PostgresSettings;
use relstore_query::{Canon, Entity, EntityStore, IdHookRegistry};
use serde_json::{json, Value};
use tracing::debug;

#[derive(Args)]
pub struct SqlCommand {
    /// Entity canon the rows belong to
    canon: String,

    /// Literal SQL with `$n` placeholders
    sql: String,

    /// Positional parameters as a JSON array
    params: Option<String>,

    /// Print the affected row count instead of rows
    #[arg(long = "execute")]
    affected_only: bool,
}

impl SqlCommand {
    pub fn execute(self, settings: &PostgresSettings) -> anyhow::Result<()> {
        let canon = Canon::parse(&self.canon)?;
        let params = match self.params.as_deref() {
            Some(text) => match parse_json(text, "parameter")? {
                Value::Array(params) => params,
                other => anyhow::bail!("Parameters must be a JSON array, got {}", other),
            },
            None => Vec::new(),
        };
        let sql = self.sql;
        let count_only = self.affected_only;

        let output = with_store(settings, IdHookRegistry::new(), |store| async move {
            let native = store.native(&canon).await?;
            debug!("Running native SQL against {}", native.table());

            let result = if count_only {
                native
                    .execute(&sql, &params)
                    .await
                    .map(|affected| json!({ "affected": affected }))
            } else {
                native
                    .query(&sql, &params)
                    .await
                    .map(|rows| Value::Array(rows.iter().map(Entity::to_json).collect()))
            };
            native.release();
            Ok(result?)
        })?;
        print_json(&output)
    }
}
