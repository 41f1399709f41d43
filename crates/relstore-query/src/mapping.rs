//! Column name mapping between logical field names and physical columns.

use std::fmt;

/// Bidirectional field/column translation, fixed for the store's lifetime.
///
/// Implementations must be deterministic and side-effect free. A round trip
/// is only expected for the pairs a given mapper defines.
pub trait ColumnMapper: Send + Sync {
    fn to_column(&self, field: &str) -> String;

    fn from_column(&self, column: &str) -> String;
}

/// Leaves names untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl ColumnMapper for IdentityMapper {
    fn to_column(&self, field: &str) -> String {
        field.to_string()
    }

    fn from_column(&self, column: &str) -> String {
        column.to_string()
    }
}

/// `camelCase` fields stored as `snake_case` columns
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeCaseMapper;

impl ColumnMapper for SnakeCaseMapper {
    fn to_column(&self, field: &str) -> String {
        let mut column = String::with_capacity(field.len() + 4);
        for ch in field.chars() {
            if ch.is_ascii_uppercase() {
                column.push('_');
                column.push(ch.to_ascii_lowercase());
            } else {
                column.push(ch);
            }
        }
        column
    }

    fn from_column(&self, column: &str) -> String {
        let mut parts = column.split('_');
        let mut field = parts.next().unwrap_or_default().to_string();
        for part in parts {
            let mut chars = part.chars();
            if let Some(first) = chars.next() {
                field.extend(first.to_uppercase());
                field.push_str(chars.as_str());
            }
        }
        field
    }
}

type NameFn = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Mapper assembled from two plain functions
pub struct FnMapper {
    to_column: NameFn,
    from_column: NameFn,
}

impl FnMapper {
    pub fn new<T, F>(to_column: T, from_column: F) -> Self
    where
        T: Fn(&str) -> String + Send + Sync + 'static,
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            to_column: Box::new(to_column),
            from_column: Box::new(from_column),
        }
    }
}

impl ColumnMapper for FnMapper {
    fn to_column(&self, field: &str) -> String {
        (self.to_column)(field)
    }

    fn from_column(&self, column: &str) -> String {
        (self.from_column)(column)
    }
}

impl fmt::Debug for FnMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMapper").finish_non_exhaustive()
    }
}
