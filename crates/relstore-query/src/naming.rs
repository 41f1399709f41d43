//! Table name resolution and identifier quoting.

use crate::error::{Result, StoreError};
use crate::mapping::ColumnMapper;
use crate::types::Canon;

/// Joins the present parts of a canon into one table name
pub const TABLE_SEPARATOR: &str = "_";

/// Physical identity column of every entity table
pub const ID_COLUMN: &str = "id";

/// Physical column for a logical field. `id` always names [`ID_COLUMN`].
pub fn column_for(mapper: &dyn ColumnMapper, field: &str) -> String {
    if field == ID_COLUMN {
        ID_COLUMN.to_string()
    } else {
        mapper.to_column(field)
    }
}

/// Quote an identifier for embedding in SQL.
///
/// Rejects empty names and NUL bytes; embedded double quotes are doubled.
pub fn quote_identifier(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(StoreError::translation("Empty identifier".to_string()));
    }
    if name.contains('\0') {
        return Err(StoreError::translation(format!(
            "Identifier {:?} contains a NUL byte",
            name
        )));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Unquoted physical table name for a canon
pub fn table_name(canon: &Canon) -> String {
    [canon.zone.as_deref(), canon.base.as_deref(), Some(canon.name.as_str())]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(TABLE_SEPARATOR)
}

/// Quoted table identifier for a canon
pub fn resolve_table(canon: &Canon) -> Result<String> {
    quote_identifier(&table_name(canon))
}
