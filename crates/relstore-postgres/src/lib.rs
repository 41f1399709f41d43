//! PostgreSQL backend for relstore
//!
//! Implements [`EntityStore`](relstore_query::EntityStore) over a
//! `deadpool-postgres` pool. Every action checks out one connection and
//! returns it before responding, on success and on failure; only
//! [`EntityStore::native`](relstore_query::EntityStore::native) hands a
//! connection to the caller.

pub mod diagnostics;
pub mod native;
pub mod params;
pub mod row;
pub mod settings;
pub mod store;

pub use native::NativeConnection;
pub use params::SqlParam;
pub use row::RowMapper;
pub use settings::{ColumnCase, PostgresSettings};
pub use store::PostgresStore;

// Pool types appear in the public API
pub use deadpool_postgres::{Pool, Status};
