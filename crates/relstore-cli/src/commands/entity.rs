use super::{parse_json, print_json, with_store};
use clap::Args;
use relstore_postgres::PostgresSettings;
use relstore_query::config::{DEFAULT_HOOK_ROLE, DEFAULT_HOOK_TARGET};
use relstore_query::{
    Canon, Entity, EntityStore, HookKey, IdHookRegistry, PrefixedUuid, Query,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

#[derive(Args)]
pub struct SaveCommand {
    /// Entity canon, e.g. `product` or `zen/moon/bar`
    canon: String,

    /// Entity data; `id` updates an existing row, `id$` sets the id of a new one
    data: String,

    /// Generate ids for new rows as `<prefix><uuid>`
    #[arg(long)]
    id_prefix: Option<String>,
}

impl SaveCommand {
    pub fn execute(self, settings: &PostgresSettings) -> anyhow::Result<()> {
        let canon = Canon::parse(&self.canon)?;
        let entity = Entity::from_json(canon, &parse_json(&self.data, "entity")?)?;

        let mut id_hooks = IdHookRegistry::new();
        if let Some(prefix) = self.id_prefix {
            id_hooks.register(
                HookKey::new(DEFAULT_HOOK_ROLE, DEFAULT_HOOK_TARGET),
                Arc::new(PrefixedUuid::new(prefix)),
            );
        }

        let saved = with_store(settings, id_hooks, |store| async move {
            Ok(store.save(entity).await?)
        })?;
        info!("Saved {} {:?}", saved.canon, saved.id);
        print_json(&saved.to_json())
    }
}

#[derive(Args)]
pub struct LoadCommand {
    canon: String,

    /// Row id; JSON numbers are passed as numbers
    id: String,
}

impl LoadCommand {
    pub fn execute(self, settings: &PostgresSettings) -> anyhow::Result<()> {
        let canon = Canon::parse(&self.canon)?;
        let id = parse_id(&self.id);

        let loaded = with_store(settings, IdHookRegistry::new(), |store| async move {
            Ok(store.load_by_id(&canon, id).await?)
        })?;
        print_json(&loaded.map(|e| e.to_json()).unwrap_or(Value::Null))
    }
}

#[derive(Args)]
pub struct ListCommand {
    canon: String,

    /// Query document, e.g. `{"price": {"gte$": 200}, "sort$": {"price": 1}}`
    query: Option<String>,
}

impl ListCommand {
    pub fn execute(self, settings: &PostgresSettings) -> anyhow::Result<()> {
        let canon = Canon::parse(&self.canon)?;
        let query = parse_query(self.query.as_deref())?;

        let entities = with_store(settings, IdHookRegistry::new(), |store| async move {
            Ok(store.list(&canon, &query).await?)
        })?;
        print_json(&Value::Array(entities.iter().map(Entity::to_json).collect()))
    }
}

#[derive(Args)]
pub struct RemoveCommand {
    canon: String,

    /// Query document selecting the rows to remove
    query: Option<String>,

    /// Remove every matching row instead of at most one
    #[arg(long)]
    all: bool,
}

impl RemoveCommand {
    pub fn execute(self, settings: &PostgresSettings) -> anyhow::Result<()> {
        let canon = Canon::parse(&self.canon)?;
        let mut query = parse_query(self.query.as_deref())?;
        query.all |= self.all;

        let removed = with_store(settings, IdHookRegistry::new(), |store| async move {
            Ok(store.remove(&canon, &query).await?)
        })?;
        print_json(&json!({ "removed": removed }))
    }
}

fn parse_query(text: Option<&str>) -> anyhow::Result<Query> {
    match text {
        Some(text) => Ok(Query::from_json(&parse_json(text, "query")?)?),
        None => Ok(Query::default()),
    }
}

/// Numbers stay numbers; anything else is a string id
fn parse_id(text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Number(_)) => value,
        _ => Value::String(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relstore_query::Selector;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42"), json!(42));
        assert_eq!(parse_id("foo1"), json!("foo1"));
        assert_eq!(parse_id("\"7\""), json!("\"7\""));
    }

    #[test]
    fn test_parse_query() {
        assert_eq!(parse_query(None).unwrap(), Query::default());
        let query = parse_query(Some(r#"{"name": "pear"}"#)).unwrap();
        assert_eq!(query.selector, Selector::eq("name", "pear"));
        assert!(parse_query(Some("{not json")).is_err());
        assert!(parse_query(Some(r#"{"price": {"near$": 1}}"#)).is_err());
    }
}
