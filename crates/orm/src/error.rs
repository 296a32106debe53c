//! Error types for the data layer
//!
//! Storage failures are carried as text so callers can surface them unchanged.

use std::fmt;

/// Result type alias for data-layer operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for data-layer operations
#[derive(Debug, Clone)]
pub enum ModelError {
    /// Database query or statement error
    Database(String),
    /// Connection pool error
    Connection(String),
    /// Schema creation or introspection error
    Schema(String),
    /// Configuration error
    Configuration(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Database(msg) => write!(f, "Database error: {}", msg),
            ModelError::Connection(msg) => write!(f, "Connection error: {}", msg),
            ModelError::Schema(msg) => write!(f, "Schema error: {}", msg),
            ModelError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

// Convert from sqlx errors
impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => ModelError::Connection(err.to_string()),
            sqlx::Error::Configuration(_) => ModelError::Configuration(err.to_string()),
            _ => ModelError::Database(err.to_string()),
        }
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Schema(format!("Invalid model metadata: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let error = ModelError::Database("violates foreign key constraint".to_string());
        assert_eq!(error.to_string(), "Database error: violates foreign key constraint");

        let error = ModelError::Schema("Table 'orders' has no create statement".to_string());
        assert!(error.to_string().starts_with("Schema error:"));
    }

    #[test]
    fn test_from_sqlx_error() {
        assert!(matches!(ModelError::from(sqlx::Error::PoolTimedOut), ModelError::Connection(_)));
        assert!(matches!(ModelError::from(sqlx::Error::RowNotFound), ModelError::Database(_)));
    }
}
