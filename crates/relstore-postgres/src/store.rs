use crate::diagnostics::{acquire_error, execution_error};
use crate::native::NativeConnection;
use crate::params::{as_refs, bind_all};
use crate::row::RowMapper;
use crate::settings::{redact_url, PostgresSettings};
use async_trait::async_trait;
use deadpool_postgres::{Object, Pool, Status};
use relstore_query::{
    Canon, Entity, EntityStore, NativeQuery, Query, Result, SqlBuilder, Statement, StoreConfig,
    StoreError,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio_postgres::{Client, Row};
use tracing::{debug, info};

/// Pooled PostgreSQL implementation of [`EntityStore`]
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: Pool,
    config: Arc<StoreConfig>,
}

impl PostgresStore {
    /// Build a pool from settings and check that the database is reachable
    pub async fn connect(settings: &PostgresSettings, config: StoreConfig) -> Result<Self> {
        debug!(
            "Connecting to PostgreSQL: {} (max {} connections)",
            redact_url(&settings.url),
            settings.max_connections
        );

        let pool = settings.create_pool()?;
        let store = Self::new(pool, config);
        drop(store.acquire().await?);

        info!(
            "PostgreSQL pool ready: {} (max {} connections)",
            redact_url(&settings.url),
            settings.max_connections
        );
        Ok(store)
    }

    /// Adopt an existing pool
    pub fn new(pool: Pool, config: StoreConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn pool_status(&self) -> Status {
        self.pool.status()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn builder(&self) -> SqlBuilder<'_> {
        SqlBuilder::new(self.config.mapper())
    }

    fn rows(&self) -> RowMapper<'_> {
        RowMapper::new(self.config.mapper())
    }

    async fn acquire(&self) -> Result<Object> {
        let client = self.pool.get().await.map_err(acquire_error)?;
        debug!("Acquired connection ({} idle)", self.pool.status().available);
        Ok(client)
    }

    /// Acquire, run, release. The connection goes back to the pool when
    /// `client` drops, whichever way this returns.
    async fn fetch(&self, stmt: &Statement) -> Result<Vec<Row>> {
        let client = self.acquire().await?;
        let rows = query(&client, &stmt.sql, &stmt.params).await;
        drop(client);
        debug!("Released connection");
        rows
    }

    async fn execute(&self, stmt: &Statement) -> Result<u64> {
        let client = self.acquire().await?;
        let affected = execute(&client, &stmt.sql, &stmt.params).await;
        drop(client);
        debug!("Released connection");
        affected
    }

    fn native_statement(native: &NativeQuery) -> Statement {
        Statement::new(native.sql.clone(), native.params.clone())
    }
}

/// Run a row-returning statement on a checked-out client
pub(crate) async fn query(client: &Client, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
    debug!("Executing query: {} ({} params)", sql, params.len());
    let started = Instant::now();

    let bound = bind_all(params);
    let rows = client
        .query(sql, &as_refs(&bound))
        .await
        .map_err(|e| execution_error(e, sql))?;

    debug!(
        "Query returned {} rows in {}ms",
        rows.len(),
        started.elapsed().as_millis()
    );
    Ok(rows)
}

/// Run a statement and return the affected row count
pub(crate) async fn execute(client: &Client, sql: &str, params: &[Value]) -> Result<u64> {
    debug!("Executing statement: {} ({} params)", sql, params.len());
    let started = Instant::now();

    let bound = bind_all(params);
    let affected = client
        .execute(sql, &as_refs(&bound))
        .await
        .map_err(|e| execution_error(e, sql))?;

    debug!(
        "Statement affected {} rows in {}ms",
        affected,
        started.elapsed().as_millis()
    );
    Ok(affected)
}

#[async_trait]
impl EntityStore for PostgresStore {
    type Native = NativeConnection;

    async fn save(&self, entity: Entity) -> Result<Entity> {
        let builder = self.builder();

        let stmt = match &entity.id {
            Some(id) => builder.update(&entity.canon, id, &entity.fields)?,
            None => {
                let id = match &entity.new_id {
                    Some(id) => Some(id.clone()),
                    None => {
                        self.config
                            .id_hooks()
                            .generate(self.config.hook_key(), &entity.canon, &entity.fields)
                            .await?
                    }
                };
                builder.insert(&entity.canon, id.as_ref(), &entity.fields)?
            }
        };

        let rows = self.fetch(&stmt).await?;
        let row = match (rows.first(), &entity.id) {
            (Some(row), _) => row,
            (None, Some(id)) => {
                return Err(StoreError::execution(format!(
                    "No {} row with id {} to update",
                    entity.canon, id
                )))
            }
            (None, None) => {
                return Err(StoreError::execution(format!(
                    "Insert into {} returned no row",
                    entity.canon
                )))
            }
        };

        let saved = self.rows().entity(&entity.canon, row)?;
        debug!("Saved {} with id {:?}", entity.canon, saved.id);
        Ok(saved)
    }

    async fn load(&self, canon: &Canon, query: &Query) -> Result<Option<Entity>> {
        let stmt = match &query.native {
            Some(native) => Self::native_statement(native),
            None => self.builder().load(canon, query)?,
        };

        let rows = self.fetch(&stmt).await?;
        rows.first()
            .map(|row| self.rows().entity(canon, row))
            .transpose()
    }

    async fn list(&self, canon: &Canon, query: &Query) -> Result<Vec<Entity>> {
        let stmt = match &query.native {
            Some(native) => Self::native_statement(native),
            None => self.builder().list(canon, query)?,
        };

        let rows = self.fetch(&stmt).await?;
        self.rows().entities(canon, &rows)
    }

    async fn remove(&self, canon: &Canon, query: &Query) -> Result<u64> {
        let stmt = match &query.native {
            Some(native) => Self::native_statement(native),
            None => self.builder().delete(canon, query)?,
        };

        let removed = self.execute(&stmt).await?;
        debug!("Removed {} rows from {}", removed, canon);
        Ok(removed)
    }

    async fn native(&self, canon: &Canon) -> Result<NativeConnection> {
        let table = relstore_query::resolve_table(canon)?;
        let client = self.acquire().await?;
        Ok(NativeConnection::new(
            client,
            canon.clone(),
            table,
            Arc::clone(&self.config),
        ))
    }
}
