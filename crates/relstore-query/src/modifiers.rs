//! Sort, limit, skip and projection clauses.

use crate::error::Result;
use crate::mapping::ColumnMapper;
use crate::naming::{column_for, quote_identifier, ID_COLUMN};
use crate::types::{Query, SortDirection};

/// Projection list. The identity column is always selected so returned
/// entities keep their id.
pub fn projection(fields: Option<&[String]>, mapper: &dyn ColumnMapper) -> Result<String> {
    let fields = match fields {
        Some(fields) if !fields.is_empty() => fields,
        _ => return Ok("*".to_string()),
    };

    let mut columns = vec![quote_identifier(ID_COLUMN)?];
    for field in fields {
        let column = quote_identifier(&column_for(mapper, field))?;
        if !columns.contains(&column) {
            columns.push(column);
        }
    }
    Ok(columns.join(", "))
}

/// `ORDER BY` clause preserving the sort mapping's order
pub fn order_by(sort: &[(String, SortDirection)], mapper: &dyn ColumnMapper) -> Result<Option<String>> {
    if sort.is_empty() {
        return Ok(None);
    }

    let mut keys = Vec::with_capacity(sort.len());
    for (field, direction) in sort {
        let column = quote_identifier(&column_for(mapper, field))?;
        keys.push(format!("{} {}", column, direction.as_sql()));
    }
    Ok(Some(format!("ORDER BY {}", keys.join(", "))))
}

/// `LIMIT`/`OFFSET` tail. Zero or absent values emit nothing.
pub fn limit_offset(limit: Option<u64>, skip: Option<u64>) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(limit) = limit.filter(|l| *l > 0) {
        parts.push(format!("LIMIT {}", limit));
    }
    if let Some(skip) = skip.filter(|s| *s > 0) {
        parts.push(format!("OFFSET {}", skip));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Every clause that follows WHERE, in fixed order:
/// ORDER BY → LIMIT → OFFSET
pub fn trailing_clauses(
    query: &Query,
    limit: Option<u64>,
    mapper: &dyn ColumnMapper,
) -> Result<Vec<String>> {
    let mut clauses = Vec::new();
    if let Some(order) = order_by(&query.sort, mapper)? {
        clauses.push(order);
    }
    if let Some(tail) = limit_offset(limit, query.effective_skip()) {
        clauses.push(tail);
    }
    Ok(clauses)
}
