//! Parser for the operator-keyed document form of a query.
//!
//! ```json
//! { "price": { "gte$": 200 }, "or$": [{ "name": "cherry" }], "sort$": { "price": 1 } }
//! ```
//!
//! Keys ending in `$` are operators or directives; any other key names a
//! field. The only exception is `ids`, which carries the opaque id list.

use crate::error::{Result, StoreError};
use crate::selector::{CompareOp, Condition, Predicate, Selector};
use crate::types::{NativeQuery, Query, SortDirection};
use serde_json::{Map, Value};

const IDS_KEY: &str = "ids";

impl Query {
    /// Parse a query document into a [`Query`]
    pub fn from_json(document: &Value) -> Result<Query> {
        let object = match document {
            Value::Object(object) => object,
            Value::Null => return Ok(Query::default()),
            // Bare scalars are id lookups, matching `load$('foo1')`
            Value::String(_) | Value::Number(_) => return Ok(Query::by_id(document.clone())),
            other => {
                return Err(StoreError::translation(format!(
                    "Query must be an object, got {}",
                    type_name(other)
                )))
            }
        };

        let mut query = Query::default();
        let mut selector_keys = Map::new();

        for (key, value) in object {
            match key.as_str() {
                "sort$" => query.sort = parse_sort(value)?,
                "limit$" => query.limit = Some(parse_count("limit$", value)?),
                "skip$" => query.skip = Some(parse_count("skip$", value)?),
                "fields$" => query.fields = Some(parse_fields(value)?),
                "all$" => {
                    query.all = value.as_bool().ok_or_else(|| {
                        StoreError::translation("all$ must be a boolean".to_string())
                    })?
                }
                "native$" => query.native = Some(parse_native(value)?),
                IDS_KEY => query.ids = Some(parse_ids(value)?),
                _ => {
                    selector_keys.insert(key.clone(), value.clone());
                }
            }
        }

        query.selector = parse_selector(&selector_keys)?;
        Ok(query)
    }
}

/// Parse one selector level. Distinct keys are conjoined.
pub fn parse_selector(object: &Map<String, Value>) -> Result<Selector> {
    let mut parts = Vec::new();

    for (key, value) in object {
        match key.as_str() {
            "or$" => parts.push(Selector::Or(parse_children("or$", value)?)),
            "and$" => parts.push(Selector::And(parse_children("and$", value)?)),
            directive if directive.ends_with('$') => {
                return Err(StoreError::translation(format!(
                    "Unknown or misplaced directive '{}'",
                    directive
                )))
            }
            field => parts.extend(parse_field(field, value)?),
        }
    }

    Ok(match parts.len() {
        0 => Selector::All,
        1 => parts.remove(0),
        _ => Selector::And(parts),
    })
}

fn parse_children(keyword: &str, value: &Value) -> Result<Vec<Selector>> {
    let items = value.as_array().ok_or_else(|| {
        StoreError::translation(format!("{} expects an array of selectors", keyword))
    })?;

    items
        .iter()
        .map(|item| match item {
            Value::Object(object) => parse_selector(object),
            other => Err(StoreError::translation(format!(
                "{} entries must be objects, got {}",
                keyword,
                type_name(other)
            ))),
        })
        .collect()
}

fn parse_field(field: &str, value: &Value) -> Result<Vec<Selector>> {
    let operators = match value {
        Value::Object(operators) => operators,
        Value::Array(_) => {
            return Err(StoreError::translation(format!(
                "Field '{}' compared against an array; use in$ for membership",
                field
            )))
        }
        scalar => return Ok(vec![Selector::eq(field, scalar.clone())]),
    };

    if operators.is_empty() {
        return Err(StoreError::translation(format!(
            "Field '{}' has an empty operator map",
            field
        )));
    }

    operators
        .iter()
        .map(|(op, operand)| {
            let predicate = parse_predicate(field, op, operand)?;
            Ok(Selector::Leaf(Condition {
                field: field.to_string(),
                predicate,
            }))
        })
        .collect()
}

fn parse_predicate(field: &str, op: &str, operand: &Value) -> Result<Predicate> {
    let compare = |op: CompareOp| -> Result<Predicate> {
        Ok(Predicate::Compare(op, operand.clone()))
    };
    match op {
        "eq$" => compare(CompareOp::Eq),
        "ne$" => compare(CompareOp::Ne),
        "gt$" => compare(CompareOp::Gt),
        "gte$" => compare(CompareOp::Gte),
        "lt$" => compare(CompareOp::Lt),
        "lte$" => compare(CompareOp::Lte),
        "in$" => Ok(Predicate::In(operand_list(field, op, operand)?)),
        "nin$" => Ok(Predicate::NotIn(operand_list(field, op, operand)?)),
        unknown => Err(StoreError::translation(format!(
            "Unknown operator '{}' on field '{}'",
            unknown, field
        ))),
    }
}

fn operand_list(field: &str, op: &str, operand: &Value) -> Result<Vec<Value>> {
    operand.as_array().cloned().ok_or_else(|| {
        StoreError::translation(format!("{} on field '{}' expects an array", op, field))
    })
}

fn parse_sort(value: &Value) -> Result<Vec<(String, SortDirection)>> {
    let object = value
        .as_object()
        .ok_or_else(|| StoreError::translation("sort$ must be an object".to_string()))?;

    object
        .iter()
        .map(|(field, direction)| {
            let direction = match direction.as_i64() {
                Some(1) => SortDirection::Asc,
                Some(-1) => SortDirection::Desc,
                _ => {
                    return Err(StoreError::translation(format!(
                        "sort$ direction for '{}' must be 1 or -1",
                        field
                    )))
                }
            };
            Ok((field.clone(), direction))
        })
        .collect()
}

fn parse_count(keyword: &str, value: &Value) -> Result<u64> {
    value.as_u64().ok_or_else(|| {
        StoreError::translation(format!("{} must be a non-negative integer", keyword))
    })
}

fn parse_fields(value: &Value) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| StoreError::translation("fields$ must be an array".to_string()))?;

    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                StoreError::translation("fields$ entries must be strings".to_string())
            })
        })
        .collect()
}

fn parse_ids(value: &Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(ids) => Ok(ids.clone()),
        other => Err(StoreError::translation(format!(
            "ids must be an array, got {}",
            type_name(other)
        ))),
    }
}

fn parse_native(value: &Value) -> Result<NativeQuery> {
    match value {
        Value::String(sql) => Ok(NativeQuery::new(sql.clone())),
        Value::Array(pair) => match pair.as_slice() {
            [Value::String(sql)] => Ok(NativeQuery::new(sql.clone())),
            [Value::String(sql), Value::Array(params)] => {
                Ok(NativeQuery::new(sql.clone()).with_params(params.clone()))
            }
            _ => Err(StoreError::translation(
                "native$ array must be [sql, [params...]]".to_string(),
            )),
        },
        other => Err(StoreError::translation(format!(
            "native$ must be a string or [sql, params], got {}",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
