//! # rocky-core
//!
//! Dependency-injection container used by the rocky test host: a mutable
//! [`ServiceCollection`] of registrations that builds into a [`ServiceProvider`]
//! resolving singleton, scoped, and transient services.

pub mod container;
pub mod errors;

pub use container::{
    ProviderScope, Resolver, ServiceCollection, ServiceDescriptor, ServiceId, ServiceProvider,
    ServiceScope,
};
pub use errors::CoreError;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
