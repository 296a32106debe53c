//! # rocky-testing - integration test host for rocky applications
//!
//! Boots an application's router on a loopback port with its dependency
//! registrations overridden for the test, and clears persisted data between
//! tests in foreign-key-safe order.
//!
//! ## Features
//!
//! - **Service overrides**: static replacements, swappable instances, data contexts
//! - **Database wiping**: dependents-first `DELETE` order with cycle detection
//! - **Test host**: axum server on an ephemeral port plus a configured reqwest client
//!
//! ## Quick Start
//!
//! ```rust
//! use rocky_testing::prelude::*;
//! use rocky_orm::{DeleteBehavior, TableMetadata};
//!
//! let tables = vec![
//!     TableMetadata::new("Customer"),
//!     TableMetadata::new("Order").references("Customer", DeleteBehavior::Cascade),
//! ];
//!
//! let order = deletion_order(&tables, &WipeOptions::default()).unwrap();
//! let names: Vec<_> = order.iter().map(|t| t.entity.as_str()).collect();
//! assert_eq!(names, vec!["Order", "Customer"]);
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod database;
pub mod dynamic;
pub mod factory;
pub mod fixture;
pub mod logging;
pub mod server;

// Re-export commonly used types
pub use app::WebApp;
pub use config::{ClientOptions, WebAppConfig};
pub use data::{DataCapability, DataServiceManager, DbContextServiceManager, MongoDbServiceManager};
pub use database::{
    create_empty_via_wipe, deletion_order, table_names_in_wipe_order, wipe_all_data, DataContextExt,
    WipeOptions,
};
pub use dynamic::{DynamicInstance, DynamicServiceDescriptor, DynamicServiceManager};
pub use factory::{configure_test_services, Startup, WebAppFactory};
pub use fixture::{FixtureConfig, WebAppFixture};
pub use server::TestServer;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        app::WebApp,
        config::{ClientOptions, WebAppConfig},
        data::{DataCapability, DataServiceManager, DbContextServiceManager},
        database::{deletion_order, DataContextExt, WipeOptions},
        dynamic::DynamicServiceManager,
        factory::Startup,
        fixture::{FixtureConfig, WebAppFixture},
        TestError, TestResult,
    };

    pub use rocky_core::{ServiceCollection, ServiceDescriptor, ServiceProvider, ServiceScope};
}

// Error handling
#[derive(thiserror::Error, Debug)]
pub enum TestError {
    #[error("Self-referencing relationships with a restricting delete behavior cannot be wiped: {}", tables.join(", "))]
    UnsupportedSelfReference { tables: Vec<String> },

    #[error("Circular reference suspected after {depth} passes; unresolved tables: {}", remaining.join(", "))]
    CircularReferenceSuspected { depth: usize, remaining: Vec<String> },

    #[error("Service '{service_type}' was not registered for dynamic override")]
    NotRegisteredForDynamicOverride { service_type: String },

    #[error("'{operation}' is not implemented by {manager}")]
    NotImplemented {
        manager: String,
        operation: &'static str,
    },

    #[error(transparent)]
    Storage(#[from] rocky_orm::ModelError),

    #[error("Container error: {0}")]
    Core(#[from] rocky_core::CoreError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Test setup error: {0}")]
    Setup(String),
}

impl TestError {
    pub fn not_implemented(manager: impl Into<String>, operation: &'static str) -> Self {
        Self::NotImplemented {
            manager: manager.into(),
            operation,
        }
    }

    pub fn not_registered<T: ?Sized + 'static>() -> Self {
        Self::NotRegisteredForDynamicOverride {
            service_type: std::any::type_name::<T>().to_string(),
        }
    }
}

pub type TestResult<T> = Result<T, TestError>;
