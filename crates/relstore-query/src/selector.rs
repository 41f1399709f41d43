//! Selector AST.
//!
//! Selectors are built either directly through the constructors below or by
//! parsing the operator-keyed document form (see [`crate::parse`]). The
//! translator only ever sees this tree, never the raw document.

use serde_json::Value;
use std::fmt;

/// Comparison operators on a single field
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }

    /// Document-form operator key without the `$` suffix
    pub fn keyword(&self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Gt => "gt",
            CompareOp::Gte => "gte",
            CompareOp::Lt => "lt",
            CompareOp::Lte => "lte",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare(CompareOp, Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
}

/// One predicate applied to one logical field
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub predicate: Predicate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Matches every row
    All,
    Leaf(Condition),
    And(Vec<Selector>),
    Or(Vec<Selector>),
    /// Membership of the identity column
    Ids(Vec<Value>),
}

impl Selector {
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Selector::Leaf(Condition {
            field: field.into(),
            predicate: Predicate::Compare(op, value.into()),
        })
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gte, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lte, value)
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Selector::Leaf(Condition {
            field: field.into(),
            predicate: Predicate::In(values.into_iter().map(Into::into).collect()),
        })
    }

    pub fn not_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Selector::Leaf(Condition {
            field: field.into(),
            predicate: Predicate::NotIn(values.into_iter().map(Into::into).collect()),
        })
    }

    pub fn and(children: Vec<Selector>) -> Self {
        Selector::And(children)
    }

    pub fn or(children: Vec<Selector>) -> Self {
        Selector::Or(children)
    }

    /// True when the selector places no constraint on rows
    pub fn is_unconstrained(&self) -> bool {
        match self {
            Selector::All => true,
            Selector::And(children) => children.iter().all(Selector::is_unconstrained),
            _ => false,
        }
    }

    /// Conjoin with another selector, flattening trivial cases
    pub fn and_also(self, other: Selector) -> Selector {
        match (self, other) {
            (Selector::All, other) => other,
            (this, Selector::All) => this,
            (Selector::And(mut children), other) => {
                children.push(other);
                Selector::And(children)
            }
            (this, other) => Selector::And(vec![this, other]),
        }
    }
}
