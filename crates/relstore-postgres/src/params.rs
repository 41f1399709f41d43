//! JSON values bound as statement parameters.
//!
//! The server infers each placeholder's type while preparing the statement;
//! [`SqlParam`] then encodes the JSON value for that type.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::error::Error;
use thiserror::Error;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};

type BoxError = Box<dyn Error + Sync + Send>;

#[derive(Debug, Error)]
pub enum BindError {
    #[error("cannot bind {found} to a {expected} parameter")]
    Incompatible { expected: String, found: &'static str },
    #[error("{value} is out of range for {expected}")]
    OutOfRange { expected: String, value: String },
    #[error("cannot parse '{value}' as {expected}")]
    Unparseable { expected: String, value: String },
    #[error("parameters of type {0} are not supported")]
    UnsupportedType(String),
}

/// Borrowed JSON value adapting itself to the server-inferred type
#[derive(Debug, Clone, Copy)]
pub struct SqlParam<'a>(pub &'a Value);

impl<'a> SqlParam<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self(value)
    }
}

/// Wrap a parameter list for a driver call
pub fn bind_all(values: &[Value]) -> Vec<SqlParam<'_>> {
    values.iter().map(SqlParam::new).collect()
}

/// Driver-shaped references to wrapped parameters
pub fn as_refs<'a>(params: &'a [SqlParam<'a>]) -> Vec<&'a (dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

impl ToSql for SqlParam<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        let value = self.0;
        if value.is_null() {
            return Ok(IsNull::Yes);
        }

        match *ty {
            Type::BOOL => as_bool(value, ty)?.to_sql(ty, out),
            Type::INT2 => {
                let n = as_i64(value, ty)?;
                i16::try_from(n).map_err(|_| out_of_range(ty, n))?.to_sql(ty, out)
            }
            Type::INT4 => {
                let n = as_i64(value, ty)?;
                i32::try_from(n).map_err(|_| out_of_range(ty, n))?.to_sql(ty, out)
            }
            Type::INT8 => as_i64(value, ty)?.to_sql(ty, out),
            Type::OID => {
                let n = as_i64(value, ty)?;
                u32::try_from(n).map_err(|_| out_of_range(ty, n))?.to_sql(ty, out)
            }
            Type::FLOAT4 => (as_f64(value, ty)? as f32).to_sql(ty, out),
            Type::FLOAT8 => as_f64(value, ty)?.to_sql(ty, out),
            Type::NUMERIC => as_decimal(value, ty)?.to_sql(ty, out),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                text.to_sql(ty, out)
            }
            Type::JSON | Type::JSONB => value.to_sql(ty, out),
            Type::UUID => {
                let text = as_str(value, ty)?;
                uuid::Uuid::parse_str(text)
                    .map_err(|_| unparseable(ty, text))?
                    .to_sql(ty, out)
            }
            Type::TIMESTAMPTZ => {
                let text = as_str(value, ty)?;
                DateTime::parse_from_rfc3339(text)
                    .map_err(|_| unparseable(ty, text))?
                    .with_timezone(&Utc)
                    .to_sql(ty, out)
            }
            Type::TIMESTAMP => {
                let text = as_str(value, ty)?;
                parse_naive_timestamp(text)
                    .ok_or_else(|| unparseable(ty, text))?
                    .to_sql(ty, out)
            }
            Type::DATE => {
                let text = as_str(value, ty)?;
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .map_err(|_| unparseable(ty, text))?
                    .to_sql(ty, out)
            }
            _ => Err(Box::new(BindError::UnsupportedType(ty.name().to_string()))),
        }
    }

    // Compatibility is decided per value in `to_sql`
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn parse_naive_timestamp(text: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn incompatible(ty: &Type, value: &Value) -> BoxError {
    Box::new(BindError::Incompatible {
        expected: ty.name().to_string(),
        found: json_kind(value),
    })
}

fn out_of_range(ty: &Type, value: impl ToString) -> BoxError {
    Box::new(BindError::OutOfRange {
        expected: ty.name().to_string(),
        value: value.to_string(),
    })
}

fn unparseable(ty: &Type, value: &str) -> BoxError {
    Box::new(BindError::Unparseable {
        expected: ty.name().to_string(),
        value: value.to_string(),
    })
}

fn as_bool(value: &Value, ty: &Type) -> Result<bool, BoxError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.as_str() {
            "true" | "t" => Ok(true),
            "false" | "f" => Ok(false),
            _ => Err(unparseable(ty, s)),
        },
        other => Err(incompatible(ty, other)),
    }
}

fn as_i64(value: &Value, ty: &Type) -> Result<i64, BoxError> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i),
            None => Err(out_of_range(ty, n)),
        },
        Value::String(s) => s.trim().parse().map_err(|_| unparseable(ty, s)),
        other => Err(incompatible(ty, other)),
    }
}

fn as_f64(value: &Value, ty: &Type) -> Result<f64, BoxError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| out_of_range(ty, n)),
        Value::String(s) => s.trim().parse().map_err(|_| unparseable(ty, s)),
        other => Err(incompatible(ty, other)),
    }
}

/// JSON numbers may print in exponent form (`1e+16`)
fn as_decimal(value: &Value, ty: &Type) -> Result<Decimal, BoxError> {
    let literal = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => return Err(incompatible(ty, other)),
    };
    Decimal::from_str_exact(&literal)
        .or_else(|_| Decimal::from_scientific(&literal))
        .map_err(|_| unparseable(ty, &literal))
}

fn as_str<'v>(value: &'v Value, ty: &Type) -> Result<&'v str, BoxError> {
    value.as_str().ok_or_else(|| incompatible(ty, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(value: Value, ty: &Type) -> Result<Vec<u8>, BoxError> {
        let mut out = BytesMut::new();
        SqlParam::new(&value).to_sql(ty, &mut out)?;
        Ok(out.to_vec())
    }

    #[test]
    fn test_integers_follow_column_width() {
        assert_eq!(encode(json!(200), &Type::INT4).unwrap(), 200i32.to_be_bytes());
        assert_eq!(encode(json!(7), &Type::INT2).unwrap(), 7i16.to_be_bytes());
        assert_eq!(encode(json!("42"), &Type::INT8).unwrap(), 42i64.to_be_bytes());
        assert!(encode(json!(70000), &Type::INT2).is_err());
        assert!(encode(json!(1.5), &Type::INT4).is_err());
        assert!(encode(json!(true), &Type::INT4).is_err());
    }

    #[test]
    fn test_text_accepts_any_scalar() {
        assert_eq!(encode(json!("pear"), &Type::TEXT).unwrap(), b"pear");
        assert_eq!(encode(json!(200), &Type::VARCHAR).unwrap(), b"200");
        assert_eq!(encode(json!(false), &Type::TEXT).unwrap(), b"false");
    }

    #[test]
    fn test_null_is_sql_null() {
        let mut out = BytesMut::new();
        let null = Value::Null;
        let result = SqlParam::new(&null).to_sql(&Type::INT4, &mut out).unwrap();
        assert!(matches!(result, IsNull::Yes));
        assert!(out.is_empty());
    }

    #[test]
    fn test_structured_and_temporal_types() {
        assert!(encode(json!({"a": 1}), &Type::JSONB).is_ok());
        assert!(encode(json!("6f1c3a2e-5b7d-4e0f-9a8b-1c2d3e4f5a6b"), &Type::UUID).is_ok());
        assert!(encode(json!("not-a-uuid"), &Type::UUID).is_err());
        assert!(encode(json!("2024-03-01T12:00:00Z"), &Type::TIMESTAMPTZ).is_ok());
        assert!(encode(json!("2024-03-01 12:00:00"), &Type::TIMESTAMP).is_ok());
        assert!(encode(json!("2024-03-01"), &Type::DATE).is_ok());
        assert!(encode(json!(12), &Type::DATE).is_err());
    }

    #[test]
    fn test_numeric_accepts_exponent_form() {
        let plain = encode(json!("12.50"), &Type::NUMERIC).unwrap();
        let mut expected = BytesMut::new();
        Decimal::new(1250, 2).to_sql(&Type::NUMERIC, &mut expected).unwrap();
        assert_eq!(plain, expected.to_vec());

        assert!(encode(json!(12.5), &Type::NUMERIC).is_ok());
        assert!(encode(json!(1e16), &Type::NUMERIC).is_ok());
        assert!(encode(json!(1e-7), &Type::NUMERIC).is_ok());
        assert!(encode(json!(2.5e20), &Type::NUMERIC).is_ok());
        assert!(encode(json!("1e+16"), &Type::NUMERIC).is_ok());

        let err = encode(json!("twelve"), &Type::NUMERIC).unwrap_err();
        assert!(err.to_string().contains("numeric"));
        assert!(encode(json!(true), &Type::NUMERIC).is_err());
    }

    #[test]
    fn test_unsupported_type() {
        let err = encode(json!("x"), &Type::BYTEA).unwrap_err();
        assert!(err.to_string().contains("bytea"));
    }
}
