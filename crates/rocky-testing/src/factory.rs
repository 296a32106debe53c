//! Service configuration for the hosted application
//!
//! The application describes itself through [`Startup`]. [`WebAppFactory`] runs
//! the application's registrations, applies the test overrides on top, and
//! builds the provider and router.

use std::marker::PhantomData;
use std::sync::Arc;

use rocky_core::{ServiceCollection, ServiceProvider};

use crate::config::WebAppConfig;
use crate::data::DataCapability;
use crate::TestResult;

/// How an application registers its services and builds its router
pub trait Startup: 'static {
    fn configure_services(services: &mut ServiceCollection);

    fn router(provider: ServiceProvider) -> axum::Router;
}

/// Apply a config's overrides to the application's registrations.
///
/// Static replacements go first, then swappable services, then data managers,
/// so later steps win when they register the same type. A data manager that
/// cannot register bindings fails the call.
pub fn configure_test_services(config: &WebAppConfig, services: &mut ServiceCollection) -> TestResult<()> {
    for descriptor in config.dependencies() {
        services.replace_preserving_lifetime(descriptor.clone());
    }

    for dynamic in config.dynamic_dependencies() {
        dynamic.add_service_descriptor(services);
    }

    for manager in config.data_dependencies() {
        if !manager.supports(DataCapability::RegisterBindings) {
            return Err(manager.unsupported(DataCapability::RegisterBindings));
        }
        manager.add_service_descriptor(services)?;
    }

    tracing::debug!(
        dependencies = config.dependencies().len(),
        dynamic = config.dynamic_dependencies().len(),
        data = config.data_dependencies().len(),
        "Applied test service overrides"
    );
    Ok(())
}

/// Builds providers and routers for the application `S` under a test config
pub struct WebAppFactory<S> {
    config: Arc<WebAppConfig>,
    _startup: PhantomData<fn() -> S>,
}

impl<S: Startup> WebAppFactory<S> {
    pub fn new(config: Arc<WebAppConfig>) -> Self {
        Self {
            config,
            _startup: PhantomData,
        }
    }

    pub fn config(&self) -> &Arc<WebAppConfig> {
        &self.config
    }

    /// The application's registrations with the test overrides applied
    pub fn configure_services(&self) -> TestResult<ServiceCollection> {
        let mut services = ServiceCollection::new();
        S::configure_services(&mut services);
        configure_test_services(&self.config, &mut services)?;
        Ok(services)
    }

    pub fn build_services(&self) -> TestResult<ServiceProvider> {
        Ok(self.configure_services()?.build())
    }

    pub fn build_router(&self, provider: &ServiceProvider) -> axum::Router {
        S::router(provider.clone())
    }

    pub fn create_client(&self) -> TestResult<reqwest::Client> {
        self.config.client_options().build_client()
    }
}
