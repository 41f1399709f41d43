pub mod entity;
pub mod sql;

pub use entity::{ListCommand, LoadCommand, RemoveCommand, SaveCommand};
pub use sql::SqlCommand;

use anyhow::Context;
use relstore_postgres::{PostgresSettings, PostgresStore};
use relstore_query::{IdHookRegistry, StoreConfig};
use serde_json::Value;
use std::future::Future;

/// Connect with `settings`, then drive `action` on a fresh runtime
pub(crate) fn with_store<F, Fut, T>(
    settings: &PostgresSettings,
    id_hooks: IdHookRegistry,
    action: F,
) -> anyhow::Result<T>
where
    F: FnOnce(PostgresStore) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let config = StoreConfig::builder()
        .shared_mapper(settings.column_case.mapper())
        .id_hooks(id_hooks)
        .build();

    // Create tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let store = PostgresStore::connect(settings, config)
            .await
            .context("Failed to connect to the database")?;
        action(store).await
    })
}

pub(crate) fn parse_json(text: &str, what: &str) -> anyhow::Result<Value> {
    serde_json::from_str(text).with_context(|| format!("Invalid {} JSON: {}", what, text))
}

pub(crate) fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
