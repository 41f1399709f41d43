use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Backend diagnostic payload attached to execution failures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Severity reported by the backend (ERROR, FATAL, ...)
    pub severity: String,
    /// SQLSTATE code, e.g. "23505"
    pub code: String,
    /// Primary message
    pub message: String,
    pub detail: Option<String>,
    pub hint: Option<String>,
    pub table: Option<String>,
    pub column: Option<String>,
    pub constraint: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if !self.code.is_empty() {
            write!(f, " (SQLSTATE {})", self.code)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, "\nDetail: {}", detail)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\nHint: {}", hint)?;
        }
        if let Some(constraint) = &self.constraint {
            write!(f, "\nConstraint: {}", constraint)?;
        }
        Ok(())
    }
}

/// Coarse error classes surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Translation,
    Connection,
    Execution,
    Mapping,
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Translation => write!(f, "translation"),
            ErrorCategory::Connection => write!(f, "connection"),
            ErrorCategory::Execution => write!(f, "execution"),
            ErrorCategory::Mapping => write!(f, "mapping"),
            ErrorCategory::Configuration => write!(f, "configuration"),
        }
    }
}

/// Unified error type for all store actions
#[derive(Error, Debug)]
pub enum StoreError {
    /// The query descriptor could not be compiled. Raised before any
    /// connection is acquired.
    #[error("Translation error: {0}")]
    Translation(String),

    /// Pool exhausted or backend unreachable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Backend rejected the compiled statement
    #[error("Execution error: {message}")]
    Execution {
        message: String,
        diagnostic: Option<Diagnostic>,
    },

    /// A result row could not be converted into an entity
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// A registered id hook failed or returned an unusable id
    #[error("Id generation failed: {0}")]
    IdGeneration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl StoreError {
    pub fn translation(msg: impl Into<String>) -> Self {
        StoreError::Translation(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        StoreError::Connection(msg.into())
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        StoreError::Execution {
            message: msg.into(),
            diagnostic: None,
        }
    }

    pub fn mapping(msg: impl Into<String>) -> Self {
        StoreError::Mapping(msg.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            StoreError::Translation(_) => ErrorCategory::Translation,
            StoreError::Connection(_) => ErrorCategory::Connection,
            StoreError::Execution { .. } | StoreError::IdGeneration(_) => ErrorCategory::Execution,
            StoreError::Mapping(_) => ErrorCategory::Mapping,
            StoreError::InvalidConfiguration(_) => ErrorCategory::Configuration,
        }
    }

    /// Backend diagnostics, when the failure came from the server
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            StoreError::Execution { diagnostic, .. } => diagnostic.as_ref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            StoreError::translation("x").category(),
            ErrorCategory::Translation
        );
        assert_eq!(
            StoreError::connection("x").category(),
            ErrorCategory::Connection
        );
        assert_eq!(
            StoreError::IdGeneration("x".into()).category(),
            ErrorCategory::Execution
        );
        assert_eq!(StoreError::mapping("x").category(), ErrorCategory::Mapping);
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic {
            severity: "ERROR".to_string(),
            code: "23505".to_string(),
            message: "duplicate key value violates unique constraint".to_string(),
            detail: Some("Key (id)=(foo1) already exists.".to_string()),
            constraint: Some("foo_pkey".to_string()),
            ..Default::default()
        };
        let text = diag.to_string();
        assert!(text.contains("SQLSTATE 23505"));
        assert!(text.contains("Key (id)=(foo1)"));
        assert!(text.contains("foo_pkey"));

        let err = StoreError::Execution {
            message: diag.message.clone(),
            diagnostic: Some(diag),
        };
        assert_eq!(err.diagnostic().map(|d| d.code.as_str()), Some("23505"));
        assert!(err.to_string().starts_with("Execution error"));
    }
}
