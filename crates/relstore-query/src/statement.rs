//! Full SQL statements for the CRUD actions.

use crate::error::{Result, StoreError};
use crate::mapping::ColumnMapper;
use crate::modifiers::{projection, trailing_clauses};
use crate::naming::{column_for, quote_identifier, resolve_table, ID_COLUMN};
use crate::selector::Selector;
use crate::translate::Translator;
use crate::types::{Canon, Query};
use serde_json::{Map, Value};

/// SQL text plus the values bound to its `$n` placeholders, in order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Builds statements against one column mapping
pub struct SqlBuilder<'a> {
    mapper: &'a dyn ColumnMapper,
}

impl<'a> SqlBuilder<'a> {
    pub fn new(mapper: &'a dyn ColumnMapper) -> Self {
        Self { mapper }
    }

    /// `list`: selector plus every modifier
    pub fn list(&self, canon: &Canon, query: &Query) -> Result<Statement> {
        self.select(canon, query, query.effective_limit())
    }

    /// `load`: same as list, capped at one row
    pub fn load(&self, canon: &Canon, query: &Query) -> Result<Statement> {
        self.select(canon, query, Some(1))
    }

    pub fn select(&self, canon: &Canon, query: &Query, limit: Option<u64>) -> Result<Statement> {
        let table = resolve_table(canon)?;
        let columns = projection(query.fields.as_deref(), self.mapper)?;

        let mut translator = Translator::new(self.mapper);
        let mut sql = format!("SELECT {} FROM {}", columns, table);
        if let Some(clause) = translator.where_clause(&effective_selector(query))? {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        for clause in trailing_clauses(query, limit, self.mapper)? {
            sql.push(' ');
            sql.push_str(&clause);
        }

        Ok(Statement::new(sql, translator.into_params()))
    }

    pub fn select_by_id(&self, canon: &Canon, id: &Value) -> Result<Statement> {
        let table = resolve_table(canon)?;
        let id_column = quote_identifier(ID_COLUMN)?;
        Ok(Statement::new(
            format!("SELECT * FROM {} WHERE {} = $1", table, id_column),
            vec![id.clone()],
        ))
    }

    /// `INSERT ... RETURNING *`. Without an id the column is left to the
    /// table default.
    pub fn insert(&self, canon: &Canon, id: Option<&Value>, fields: &Map<String, Value>) -> Result<Statement> {
        let table = resolve_table(canon)?;

        let mut columns = Vec::with_capacity(fields.len() + 1);
        let mut params = Vec::with_capacity(fields.len() + 1);
        if let Some(id) = id {
            columns.push(quote_identifier(ID_COLUMN)?);
            params.push(id.clone());
        }
        for (column, value) in self.assignments(fields)? {
            columns.push(column);
            params.push(value);
        }

        if columns.is_empty() {
            return Ok(Statement::new(
                format!("INSERT INTO {} DEFAULT VALUES RETURNING *", table),
                params,
            ));
        }

        let placeholders: Vec<String> = (1..=params.len()).map(|n| format!("${}", n)).collect();
        Ok(Statement::new(
            format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
                table,
                columns.join(", "),
                placeholders.join(", ")
            ),
            params,
        ))
    }

    /// `UPDATE ... WHERE id = $n RETURNING *`. An update with no fields
    /// reads the row back unchanged.
    pub fn update(&self, canon: &Canon, id: &Value, fields: &Map<String, Value>) -> Result<Statement> {
        let assignments = self.assignments(fields)?;
        if assignments.is_empty() {
            return self.select_by_id(canon, id);
        }

        let table = resolve_table(canon)?;
        let mut translator = Translator::new(self.mapper);
        let mut sets = Vec::with_capacity(assignments.len());
        for (column, value) in assignments {
            let placeholder = translator.bind(value);
            sets.push(format!("{} = {}", column, placeholder));
        }
        let id_placeholder = translator.bind(id.clone());

        Ok(Statement::new(
            format!(
                "UPDATE {} SET {} WHERE {} = {} RETURNING *",
                table,
                sets.join(", "),
                quote_identifier(ID_COLUMN)?,
                id_placeholder
            ),
            translator.into_params(),
        ))
    }

    /// With `all`, every matching row. Otherwise at most one, chosen by
    /// sort and skip.
    pub fn delete(&self, canon: &Canon, query: &Query) -> Result<Statement> {
        let table = resolve_table(canon)?;
        let mut translator = Translator::new(self.mapper);
        let where_clause = translator.where_clause(&effective_selector(query))?;

        let sql = if query.all {
            match where_clause {
                Some(clause) => format!("DELETE FROM {} WHERE {}", table, clause),
                None => format!("DELETE FROM {}", table),
            }
        } else {
            let id_column = quote_identifier(ID_COLUMN)?;
            let mut inner = format!("SELECT {} FROM {}", id_column, table);
            if let Some(clause) = where_clause {
                inner.push_str(" WHERE ");
                inner.push_str(&clause);
            }
            for clause in trailing_clauses(query, Some(1), self.mapper)? {
                inner.push(' ');
                inner.push_str(&clause);
            }
            format!("DELETE FROM {} WHERE {} IN ({})", table, id_column, inner)
        };

        Ok(Statement::new(sql, translator.into_params()))
    }

    /// Quoted column/value pairs for the writable fields of an entity
    fn assignments(&self, fields: &Map<String, Value>) -> Result<Vec<(String, Value)>> {
        let mut pairs: Vec<(String, Value)> = Vec::with_capacity(fields.len());
        for (field, value) in fields {
            let column = column_for(self.mapper, field);
            if column == ID_COLUMN {
                return Err(StoreError::translation(format!(
                    "Field '{}' maps to the identity column; pass it as the entity id",
                    field
                )));
            }
            let column = quote_identifier(&column)?;
            if pairs.iter().any(|(existing, _)| *existing == column) {
                return Err(StoreError::translation(format!(
                    "Field '{}' maps to column {} more than once",
                    field, column
                )));
            }
            pairs.push((column, value.clone()));
        }
        Ok(pairs)
    }
}

/// Selector AND-ed with the opaque id list, if any
fn effective_selector(query: &Query) -> Selector {
    match &query.ids {
        Some(ids) => query.selector.clone().and_also(Selector::Ids(ids.clone())),
        None => query.selector.clone(),
    }
}
