//! Per-collection fixture owning a shared [`WebAppConfig`]

use std::marker::PhantomData;
use std::sync::Arc;

use crate::app::WebApp;
use crate::config::WebAppConfig;
use crate::factory::Startup;
use crate::TestResult;

/// Supplies the configuration for a fixture
pub trait FixtureConfig: 'static {
    fn config() -> WebAppConfig;
}

/// Builds the configuration once and starts web apps of `S` from it
pub struct WebAppFixture<S, C> {
    config: Arc<WebAppConfig>,
    _marker: PhantomData<fn() -> (S, C)>,
}

impl<S: Startup, C: FixtureConfig> WebAppFixture<S, C> {
    pub fn new() -> Self {
        Self {
            config: C::config().shared(),
            _marker: PhantomData,
        }
    }

    pub fn config(&self) -> &Arc<WebAppConfig> {
        &self.config
    }

    pub async fn create_web_app(&self) -> TestResult<WebApp<S>> {
        WebApp::start(self.config.clone()).await
    }
}

impl<S: Startup, C: FixtureConfig> Default for WebAppFixture<S, C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientOptions;
    use axum::routing::get;
    use rocky_core::{ServiceCollection, ServiceProvider};

    struct PingApp;

    impl Startup for PingApp {
        fn configure_services(services: &mut ServiceCollection) {
            services.add_singleton_instance(Arc::new(String::from("pong")));
        }

        fn router(provider: ServiceProvider) -> axum::Router {
            let reply = provider
                .get_service::<String>()
                .ok()
                .flatten()
                .map(|s| s.as_str().to_owned())
                .unwrap_or_default();
            axum::Router::new().route("/ping", get(move || async move { reply }))
        }
    }

    struct PingConfig;

    impl FixtureConfig for PingConfig {
        fn config() -> WebAppConfig {
            WebAppConfig::new(ClientOptions::default().with_cookies(false))
        }
    }

    #[tokio::test]
    async fn test_web_apps_share_the_fixture_config() {
        let fixture = WebAppFixture::<PingApp, PingConfig>::new();

        let first = fixture.create_web_app().await.unwrap();
        let second = fixture.create_web_app().await.unwrap();
        assert_ne!(first.address(), second.address());
        assert_eq!(Arc::strong_count(fixture.config()), 3);

        let body = first.get("/ping").send().await.unwrap().text().await.unwrap();
        assert_eq!(body, "pong");

        first.dispose().await.unwrap();
        second.dispose().await.unwrap();
        assert_eq!(Arc::strong_count(fixture.config()), 1);
    }
}
