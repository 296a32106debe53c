//! A running application under test

use std::net::SocketAddr;
use std::sync::Arc;

use rocky_core::{ProviderScope, ServiceProvider};

use crate::config::WebAppConfig;
use crate::dynamic::DynamicInstance;
use crate::factory::{Startup, WebAppFactory};
use crate::server::TestServer;
use crate::TestResult;

/// The application `S` served on a loopback port with its test overrides applied
pub struct WebApp<S> {
    factory: WebAppFactory<S>,
    provider: ServiceProvider,
    server: TestServer,
    client: reqwest::Client,
}

impl<S: Startup> WebApp<S> {
    /// Build the services and router of `S` under `config` and start serving
    pub async fn start(config: Arc<WebAppConfig>) -> TestResult<Self> {
        let factory = WebAppFactory::<S>::new(config);
        let provider = factory.build_services()?;
        let client = factory.create_client()?;
        let server = TestServer::start(factory.build_router(&provider)).await?;

        tracing::info!(
            app = std::any::type_name::<S>(),
            address = %server.address(),
            "Started web app"
        );

        Ok(Self {
            factory,
            provider,
            server,
            client,
        })
    }

    pub fn config(&self) -> &Arc<WebAppConfig> {
        self.factory.config()
    }

    /// The root provider
    pub fn services(&self) -> &ServiceProvider {
        &self.provider
    }

    pub fn create_scope(&self) -> ProviderScope {
        self.provider.create_scope()
    }

    /// Resolve `T` inside `scope`, or inside a new scope when none is given
    pub fn get_service<T>(&self, scope: Option<&ProviderScope>) -> TestResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let service = match scope {
            Some(scope) => scope.get_service::<T>()?,
            None => self.create_scope().get_service::<T>()?,
        };
        Ok(service)
    }

    /// Swap the instance every later resolution of `T` returns
    pub fn set_service<T>(&self, instance: Arc<T>) -> TestResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        DynamicInstance::<T>::from_provider(&self.provider)?.set(instance)?;
        tracing::debug!(service = std::any::type_name::<T>(), "Swapped dynamic service");
        Ok(())
    }

    /// Restore the instance `T` was registered with
    pub fn reset_service<T>(&self) -> TestResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        DynamicInstance::<T>::from_provider(&self.provider)?.reset()?;
        Ok(())
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn address(&self) -> SocketAddr {
        self.server.address()
    }

    /// Absolute URL for `path` under the configured base path
    pub fn url(&self, path: &str) -> String {
        self.server.url(&self.config().client_options().request_path(path))
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Clear persisted data through every data manager, in configuration order
    pub async fn cleanup_data(&self) -> TestResult<()> {
        for manager in self.config().data_dependencies() {
            manager.cleanup_data(&self.provider).await?;
        }
        Ok(())
    }

    /// Clean up structures flagged for it and stop the server
    pub async fn dispose(self) -> TestResult<()> {
        for manager in self.config().data_dependencies() {
            if manager.clean_structure_on_exit() {
                manager.cleanup_structure(&self.provider).await?;
            }
        }
        self.server.shutdown().await
    }
}
