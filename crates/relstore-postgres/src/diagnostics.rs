//! Driver and pool failures → [`StoreError`].

use deadpool_postgres::PoolError;
use relstore_query::{Diagnostic, StoreError};
use std::error::Error as _;
use tracing::error;

/// Backend payload of a server-side failure
pub fn diagnostic(e: &tokio_postgres::Error) -> Option<Diagnostic> {
    let db_error = e.as_db_error()?;
    Some(Diagnostic {
        severity: db_error.severity().to_string(),
        code: db_error.code().code().to_string(),
        message: db_error.message().to_string(),
        detail: db_error.detail().map(str::to_string),
        hint: db_error.hint().map(str::to_string),
        table: db_error.table().map(str::to_string),
        column: db_error.column().map(str::to_string),
        constraint: db_error.constraint().map(str::to_string),
    })
}

/// Classify a driver error raised while running `sql`
pub fn execution_error(e: tokio_postgres::Error, sql: &str) -> StoreError {
    error!("PostgreSQL statement failed: {}", e);
    error!("Failed SQL: {}", sql);

    if e.is_closed() {
        return StoreError::connection(format!("Connection closed: {}", e));
    }

    match diagnostic(&e) {
        Some(diagnostic) => StoreError::Execution {
            message: diagnostic.to_string(),
            diagnostic: Some(diagnostic),
        },
        // Client-side failures, e.g. a parameter that cannot be encoded
        None => {
            let message = match e.source() {
                Some(source) => format!("{}: {}", e, source),
                None => e.to_string(),
            };
            StoreError::execution(message)
        }
    }
}

/// Classify a failure to acquire a pooled connection
pub fn acquire_error(e: PoolError) -> StoreError {
    error!("Failed to acquire PostgreSQL connection: {}", e);
    match e {
        PoolError::Timeout(kind) => {
            StoreError::connection(format!("Timed out acquiring a connection ({:?})", kind))
        }
        PoolError::Backend(e) => StoreError::connection(format!("Backend unreachable: {}", e)),
        other => StoreError::connection(other.to_string()),
    }
}
