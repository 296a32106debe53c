//! Database Backend Abstractions
//!
//! Backend kinds matter to callers that emit raw SQL, e.g. for identifier quoting.

pub mod postgres;

pub use postgres::{introspect_model, PgDataContext};

/// Database backend type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseBackendType {
    PostgreSQL,
    MySQL,
    SQLite,
    SqlServer,
}

impl DatabaseBackendType {
    /// SQL Server quotes identifiers with brackets rather than double quotes
    pub fn is_sql_server(&self) -> bool {
        matches!(self, DatabaseBackendType::SqlServer)
    }
}

impl std::fmt::Display for DatabaseBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseBackendType::PostgreSQL => write!(f, "postgresql"),
            DatabaseBackendType::MySQL => write!(f, "mysql"),
            DatabaseBackendType::SQLite => write!(f, "sqlite"),
            DatabaseBackendType::SqlServer => write!(f, "sqlserver"),
        }
    }
}

impl std::str::FromStr for DatabaseBackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(DatabaseBackendType::PostgreSQL),
            "mysql" => Ok(DatabaseBackendType::MySQL),
            "sqlite" => Ok(DatabaseBackendType::SQLite),
            "sqlserver" | "mssql" => Ok(DatabaseBackendType::SqlServer),
            _ => Err(format!("Unsupported database backend: {}", s)),
        }
    }
}
