//! # relstore-query
//!
//! Backend-neutral core of the relstore entity adapter.
//!
//! This crate turns operator-based query documents into parameterized SQL:
//! - **Selector**: tagged AST parsed from `$`-suffixed operator documents
//! - **Translator**: selector tree → WHERE clause + positional parameters
//! - **Modifiers**: sort, limit, skip and projection clauses
//! - **SqlBuilder**: complete SELECT / INSERT / UPDATE / DELETE statements
//! - **ColumnMapper**: field ↔ column naming policy
//! - **IdHookRegistry**: pluggable pre-insert id generation
//!
//! Backends implement [`EntityStore`] on top of these pieces; see
//! `relstore-postgres`.
//!
//! ## Example
//!
//! ```rust
//! use relstore_query::{Canon, IdentityMapper, Query, SqlBuilder};
//! use serde_json::json;
//!
//! # fn example() -> relstore_query::Result<()> {
//! let query = Query::from_json(&json!({
//!     "price": { "gte$": 200 },
//!     "sort$": { "price": 1 },
//!     "limit$": 1,
//! }))?;
//!
//! let stmt = SqlBuilder::new(&IdentityMapper).list(&Canon::new("product"), &query)?;
//! assert_eq!(
//!     stmt.sql,
//!     "SELECT * FROM \"product\" WHERE \"price\" >= $1 ORDER BY \"price\" ASC LIMIT 1"
//! );
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod hooks;
pub mod mapping;
pub mod modifiers;
pub mod naming;
pub mod parse;
pub mod selector;
pub mod statement;
pub mod traits;
pub mod translate;
pub mod types;

// Re-export commonly used items
pub use config::{StoreConfig, StoreConfigBuilder};
pub use error::{Diagnostic, ErrorCategory, Result, StoreError};
pub use hooks::{HookKey, IdGenerator, IdHookRegistry, PrefixedUuid};
pub use mapping::{ColumnMapper, FnMapper, IdentityMapper, SnakeCaseMapper};
pub use naming::{column_for, quote_identifier, resolve_table, table_name, ID_COLUMN};
pub use parse::parse_selector;
pub use selector::{CompareOp, Condition, Predicate, Selector};
pub use statement::{SqlBuilder, Statement};
pub use traits::EntityStore;
pub use translate::Translator;
pub use types::{Canon, Entity, NativeQuery, Query, SortDirection};
