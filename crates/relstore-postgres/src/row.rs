//! Result rows → entities.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use relstore_query::{Canon, ColumnMapper, Entity, Result, StoreError, ID_COLUMN};
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use tokio_postgres::types::{FromSql, Type};
use tokio_postgres::Row;

/// Converts rows through a column mapping
pub struct RowMapper<'a> {
    mapper: &'a dyn ColumnMapper,
}

impl<'a> RowMapper<'a> {
    pub fn new(mapper: &'a dyn ColumnMapper) -> Self {
        Self { mapper }
    }

    /// The `id` column becomes the entity id; every other column passes
    /// through `from_column`.
    pub fn entity(&self, canon: &Canon, row: &Row) -> Result<Entity> {
        let mut entity = Entity::new(canon.clone());
        let mut fields = Map::new();

        for (idx, column) in row.columns().iter().enumerate() {
            let value = extract_value(row, idx)?;
            if column.name() == ID_COLUMN {
                entity.id = (!value.is_null()).then_some(value);
                continue;
            }

            let field = self.mapper.from_column(column.name());
            if field.is_empty() {
                return Err(StoreError::mapping(format!(
                    "Column '{}' maps to an empty field name",
                    column.name()
                )));
            }
            if field == ID_COLUMN {
                return Err(StoreError::mapping(format!(
                    "Column '{}' maps to field '{}', which is reserved for the entity id",
                    column.name(),
                    field
                )));
            }
            if fields.contains_key(&field) {
                return Err(StoreError::mapping(format!(
                    "Column '{}' maps to field '{}', which is already present",
                    column.name(),
                    field
                )));
            }
            fields.insert(field, value);
        }

        entity.fields = fields;
        Ok(entity)
    }

    pub fn entities(&self, canon: &Canon, rows: &[Row]) -> Result<Vec<Entity>> {
        rows.iter().map(|row| self.entity(canon, row)).collect()
    }
}

fn get<'r, T: FromSql<'r>>(row: &'r Row, idx: usize) -> Result<Option<T>> {
    row.try_get::<_, Option<T>>(idx).map_err(|e| {
        let column = &row.columns()[idx];
        StoreError::mapping(format!(
            "Column '{}' ({}) could not be read: {}",
            column.name(),
            column.type_(),
            e
        ))
    })
}

fn float(value: f64) -> Value {
    // NaN and infinities have no JSON number form
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(value.to_string()))
}

/// Extract one column as JSON
pub fn extract_value(row: &Row, idx: usize) -> Result<Value> {
    let column = &row.columns()[idx];
    let ty = column.type_();

    let value = match *ty {
        Type::BOOL => get::<bool>(row, idx)?.map(Value::Bool),
        Type::INT2 => get::<i16>(row, idx)?.map(|v| Value::Number(v.into())),
        Type::INT4 => get::<i32>(row, idx)?.map(|v| Value::Number(v.into())),
        Type::INT8 => get::<i64>(row, idx)?.map(|v| Value::Number(v.into())),
        Type::OID => get::<u32>(row, idx)?.map(|v| Value::Number(v.into())),
        Type::FLOAT4 => get::<f32>(row, idx)?.map(|v| float(f64::from(v))),
        Type::FLOAT8 => get::<f64>(row, idx)?.map(float),
        // Decimal text keeps precision a JSON float would lose
        Type::NUMERIC => get::<Decimal>(row, idx)?.map(|d| Value::String(d.to_string())),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            get::<String>(row, idx)?.map(Value::String)
        }
        Type::JSON | Type::JSONB => get::<Value>(row, idx)?,
        Type::UUID => get::<uuid::Uuid>(row, idx)?.map(|v| Value::String(v.to_string())),
        Type::TIMESTAMPTZ => {
            get::<DateTime<Utc>>(row, idx)?.map(|v| Value::String(v.to_rfc3339()))
        }
        Type::TIMESTAMP => get::<NaiveDateTime>(row, idx)?
            .map(|v| Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        Type::DATE => get::<NaiveDate>(row, idx)?.map(|v| Value::String(v.to_string())),
        _ => {
            // Text-like extension types (citext, ...) still decode as strings
            if <String as FromSql<'_>>::accepts(ty) {
                get::<String>(row, idx)?.map(Value::String)
            } else {
                return Err(StoreError::mapping(format!(
                    "Column '{}' has unsupported type {}",
                    column.name(),
                    ty
                )));
            }
        }
    };

    Ok(value.unwrap_or(Value::Null))
}
