//! Web app test configuration
//!
//! A [`WebAppConfig`] is built once per fixture and lists the HTTP client options
//! and the overrides applied to the application's registrations.

use std::sync::Arc;

use rocky_core::ServiceDescriptor;

use crate::data::DataServiceManager;
use crate::dynamic::{DynamicServiceDescriptor, DynamicServiceManager};
use crate::TestResult;

/// Options for the HTTP client handed to tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Path prefix prepended to every request path
    pub base_path: String,
    pub allow_auto_redirect: bool,
    pub max_automatic_redirections: usize,
    /// Keep cookies between requests
    pub handle_cookies: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_path: "/".to_string(),
            allow_auto_redirect: true,
            max_automatic_redirections: 7,
            handle_cookies: true,
        }
    }
}

impl ClientOptions {
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_auto_redirect(mut self, allow: bool) -> Self {
        self.allow_auto_redirect = allow;
        self
    }

    pub fn with_max_automatic_redirections(mut self, max: usize) -> Self {
        self.max_automatic_redirections = max;
        self
    }

    pub fn with_cookies(mut self, handle: bool) -> Self {
        self.handle_cookies = handle;
        self
    }

    /// Build a reqwest client honoring these options
    pub fn build_client(&self) -> TestResult<reqwest::Client> {
        let redirect = if self.allow_auto_redirect {
            reqwest::redirect::Policy::limited(self.max_automatic_redirections)
        } else {
            reqwest::redirect::Policy::none()
        };

        let client = reqwest::Client::builder()
            .redirect(redirect)
            .cookie_store(self.handle_cookies)
            .build()?;
        Ok(client)
    }

    /// Join the base path and a request path with exactly one `/` between them
    pub fn request_path(&self, path: &str) -> String {
        let base = self.base_path.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

/// Overrides and client options shared by every web app of a fixture
#[derive(Default)]
pub struct WebAppConfig {
    client_options: ClientOptions,
    dependencies: Vec<ServiceDescriptor>,
    dynamic_dependencies: Vec<Box<dyn DynamicServiceDescriptor>>,
    data_dependencies: Vec<Box<dyn DataServiceManager>>,
}

impl WebAppConfig {
    pub fn new(client_options: ClientOptions) -> Self {
        Self {
            client_options,
            ..Self::default()
        }
    }

    /// Replace the application's registration of the descriptor's type, keeping its lifetime
    pub fn with_dependency(mut self, descriptor: ServiceDescriptor) -> Self {
        self.dependencies.push(descriptor);
        self
    }

    /// Make `T` swappable at test time, starting from `default`
    pub fn with_dynamic<T>(self, default: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.with_dynamic_dependency(DynamicServiceManager::new(default))
    }

    pub fn with_dynamic_dependency(mut self, descriptor: impl DynamicServiceDescriptor + 'static) -> Self {
        self.dynamic_dependencies.push(Box::new(descriptor));
        self
    }

    pub fn with_data_dependency(mut self, manager: impl DataServiceManager + 'static) -> Self {
        self.data_dependencies.push(Box::new(manager));
        self
    }

    pub fn client_options(&self) -> &ClientOptions {
        &self.client_options
    }

    pub fn dependencies(&self) -> &[ServiceDescriptor] {
        &self.dependencies
    }

    pub fn dynamic_dependencies(&self) -> &[Box<dyn DynamicServiceDescriptor>] {
        &self.dynamic_dependencies
    }

    pub fn data_dependencies(&self) -> &[Box<dyn DataServiceManager>] {
        &self.data_dependencies
    }

    /// Freeze the configuration for sharing between web apps
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl std::fmt::Debug for WebAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebAppConfig")
            .field("client_options", &self.client_options)
            .field("dependencies", &self.dependencies.len())
            .field("dynamic_dependencies", &self.dynamic_dependencies.len())
            .field(
                "data_dependencies",
                &self.data_dependencies.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MongoDbServiceManager;

    trait Greeter: Send + Sync {}
    struct Hello;
    impl Greeter for Hello {}

    #[test]
    fn test_client_option_defaults() {
        let options = ClientOptions::default();
        assert_eq!(options.base_path, "/");
        assert!(options.allow_auto_redirect);
        assert_eq!(options.max_automatic_redirections, 7);
        assert!(options.handle_cookies);
    }

    #[test]
    fn test_request_path() {
        let options = ClientOptions::default();
        assert_eq!(options.request_path("/health"), "/health");
        assert_eq!(options.request_path("health"), "/health");

        let options = options.with_base_path("/api/");
        assert_eq!(options.request_path("/users"), "/api/users");
    }

    #[test]
    fn test_builds_client_without_redirects() {
        let options = ClientOptions::default().with_auto_redirect(false).with_cookies(false);
        assert!(options.build_client().is_ok());
    }

    #[test]
    fn test_config_collects_overrides() {
        let config = WebAppConfig::new(ClientOptions::default().with_base_path("/api"))
            .with_dependency(ServiceDescriptor::singleton_instance(Arc::new(42u32)))
            .with_dynamic::<dyn Greeter>(Arc::new(Hello))
            .with_data_dependency(MongoDbServiceManager::default());

        assert_eq!(config.client_options().base_path, "/api");
        assert_eq!(config.dependencies().len(), 1);
        assert_eq!(config.dynamic_dependencies().len(), 1);
        assert_eq!(config.data_dependencies()[0].name(), "MongoDbServiceManager");
        assert!(format!("{:?}", config).contains("MongoDbServiceManager"));
    }
}
