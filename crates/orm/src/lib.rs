//! # rocky-orm: Data layer for rocky
//!
//! Table metadata with foreign keys and delete behavior, the [`DataContext`]
//! abstraction the test host wipes and creates schemas through, and a
//! PostgreSQL implementation on top of sqlx.

pub mod backends;
pub mod context;
pub mod error;
pub mod metadata;

pub use backends::{introspect_model, DatabaseBackendType, PgDataContext};
pub use context::{DataContext, DbContext, DbContextOptions, PoolConfig};
pub use error::{ModelError, ModelResult};
pub use metadata::{DataModel, DeleteBehavior, Entity, ForeignKey, ModelDefinition, TableMetadata};
