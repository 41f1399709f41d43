//! Raw connection handle for native SQL.

use crate::row::RowMapper;
use crate::store::{execute, query};
use deadpool_postgres::Object;
use relstore_query::{Canon, Entity, Result, StoreConfig};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio_postgres::Client;
use tracing::{debug, warn};

/// A pooled connection checked out for the caller.
///
/// Call [`NativeConnection::release`] exactly once when done. Because it
/// takes the handle by value a second release cannot compile. A handle that
/// is dropped without release logs a warning; the pool still reclaims it.
pub struct NativeConnection {
    client: Object,
    canon: Canon,
    table: String,
    config: Arc<StoreConfig>,
    released: bool,
}

impl NativeConnection {
    pub(crate) fn new(client: Object, canon: Canon, table: String, config: Arc<StoreConfig>) -> Self {
        debug!("Checked out native connection for {}", canon);
        Self {
            client,
            canon,
            table,
            config,
            released: false,
        }
    }

    /// Underlying driver client
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn canon(&self) -> &Canon {
        &self.canon
    }

    /// Quoted table identifier of the entity this handle was opened for
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Run literal SQL; rows are mapped to entities through the store's
    /// column mapping
    pub async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Entity>> {
        let rows = query(self.client(), sql, params).await?;
        RowMapper::new(self.config.mapper()).entities(&self.canon, &rows)
    }

    /// Run literal SQL, returning the affected row count
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        execute(self.client(), sql, params).await
    }

    /// Return the connection to the pool
    pub fn release(mut self) {
        self.released = true;
        debug!("Released native connection for {}", self.canon);
    }
}

impl Drop for NativeConnection {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                "Native connection for {} dropped without release; returning it to the pool",
                self.canon
            );
        }
    }
}

impl fmt::Debug for NativeConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeConnection")
            .field("canon", &self.canon)
            .field("table", &self.table)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}
