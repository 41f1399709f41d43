//! Selector tree → parameterized WHERE clause.
//!
//! Values are never embedded in SQL text: each one is appended to the
//! parameter list and referenced by its 1-based `$n` placeholder, so the
//! placeholder numbering always matches the order of `params`.

use crate::error::{Result, StoreError};
use crate::mapping::ColumnMapper;
use crate::naming::{column_for, quote_identifier, ID_COLUMN};
use crate::selector::{CompareOp, Condition, Predicate, Selector};
use serde_json::Value;

const SQL_TRUE: &str = "TRUE";
const SQL_FALSE: &str = "FALSE";

/// Compiles selectors against a running parameter list
pub struct Translator<'a> {
    mapper: &'a dyn ColumnMapper,
    params: Vec<Value>,
}

impl<'a> Translator<'a> {
    pub fn new(mapper: &'a dyn ColumnMapper) -> Self {
        Self::with_params(mapper, Vec::new())
    }

    /// Continue numbering after parameters that are already bound
    pub fn with_params(mapper: &'a dyn ColumnMapper, params: Vec<Value>) -> Self {
        Self { mapper, params }
    }

    /// Quoted physical column for a logical field
    pub fn column(&self, field: &str) -> Result<String> {
        quote_identifier(&column_for(self.mapper, field))
    }

    /// Append a value and return its placeholder
    pub fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }

    /// `None` when the selector places no constraint on rows
    pub fn where_clause(&mut self, selector: &Selector) -> Result<Option<String>> {
        if selector.is_unconstrained() {
            return Ok(None);
        }
        self.compile(selector).map(Some)
    }

    pub fn compile(&mut self, selector: &Selector) -> Result<String> {
        match selector {
            Selector::All => Ok(SQL_TRUE.to_string()),
            Selector::Leaf(condition) => self.condition(condition),
            Selector::And(children) => self.junction(children, true),
            Selector::Or(children) => self.junction(children, false),
            Selector::Ids(ids) => {
                let column = quote_identifier(ID_COLUMN)?;
                self.membership(&column, ID_COLUMN, ids, false)
            }
        }
    }

    fn junction(&mut self, children: &[Selector], conjunction: bool) -> Result<String> {
        let (separator, empty) = if conjunction {
            (" AND ", SQL_TRUE)
        } else {
            (" OR ", SQL_FALSE)
        };

        let mut parts = Vec::with_capacity(children.len());
        for child in children {
            // Unconstrained children add nothing to a conjunction
            if conjunction && child.is_unconstrained() {
                continue;
            }
            parts.push(self.compile(child)?);
        }

        Ok(match parts.len() {
            0 => empty.to_string(),
            1 => parts.remove(0),
            _ => format!("({})", parts.join(separator)),
        })
    }

    fn condition(&mut self, condition: &Condition) -> Result<String> {
        let column = self.column(&condition.field)?;
        match &condition.predicate {
            Predicate::Compare(op, value) => self.comparison(&column, &condition.field, *op, value),
            Predicate::In(values) => self.membership(&column, &condition.field, values, false),
            Predicate::NotIn(values) => self.membership(&column, &condition.field, values, true),
        }
    }

    fn comparison(
        &mut self,
        column: &str,
        field: &str,
        op: CompareOp,
        value: &Value,
    ) -> Result<String> {
        match (op, value) {
            (CompareOp::Eq, Value::Null) => Ok(format!("{} IS NULL", column)),
            (CompareOp::Ne, Value::Null) => Ok(format!("{} IS NOT NULL", column)),
            (_, Value::Null) => Err(StoreError::translation(format!(
                "{}$ on field '{}' cannot compare against null",
                op.keyword(),
                field
            ))),
            _ => {
                ensure_scalar(field, value)?;
                let placeholder = self.bind(value.clone());
                Ok(format!("{} {} {}", column, op.as_sql(), placeholder))
            }
        }
    }

    fn membership(
        &mut self,
        column: &str,
        field: &str,
        values: &[Value],
        negated: bool,
    ) -> Result<String> {
        // `IN ()` is not valid SQL
        if values.is_empty() {
            let constant = if negated { SQL_TRUE } else { SQL_FALSE };
            return Ok(constant.to_string());
        }

        let mut placeholders = Vec::with_capacity(values.len());
        for value in values {
            ensure_scalar(field, value)?;
            placeholders.push(self.bind(value.clone()));
        }

        let keyword = if negated { "NOT IN" } else { "IN" };
        Ok(format!("{} {} ({})", column, keyword, placeholders.join(", ")))
    }
}

fn ensure_scalar(field: &str, value: &Value) -> Result<()> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(StoreError::translation(format!(
            "Field '{}' expects a scalar value",
            field
        ))),
        _ => Ok(()),
    }
}
