use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::container::descriptor::{ErasedInstance, ServiceFactory, ServiceId};
use crate::container::provider::{Resolver, ServiceProvider};
use crate::errors::CoreError;

/// Service lifetime enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceScope {
    /// Single instance shared across the application
    #[default]
    Singleton,
    /// New instance created for each resolution
    Transient,
    /// Instance shared within one provider scope (e.g. a request)
    Scoped,
}

impl ServiceScope {
    /// Get the scope name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceScope::Singleton => "singleton",
            ServiceScope::Transient => "transient",
            ServiceScope::Scoped => "scoped",
        }
    }
}

impl std::fmt::Display for ServiceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ServiceScope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "singleton" => Ok(ServiceScope::Singleton),
            "transient" => Ok(ServiceScope::Transient),
            "scoped" => Ok(ServiceScope::Scoped),
            _ => Err(CoreError::InvalidServiceScope {
                scope: s.to_string(),
            }),
        }
    }
}

/// Unique identifier for a provider scope
pub type ScopeId = uuid::Uuid;

/// A resolution scope created from a [`ServiceProvider`].
///
/// Scoped services resolved through the same `ProviderScope` share one instance;
/// the instances are released when the scope is dropped.
pub struct ProviderScope {
    scope_id: ScopeId,
    provider: ServiceProvider,
    instances: RwLock<HashMap<ServiceId, ErasedInstance>>,
}

impl ProviderScope {
    pub(crate) fn new(provider: ServiceProvider) -> Self {
        Self {
            scope_id: uuid::Uuid::new_v4(),
            provider,
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Get the scope ID
    pub fn scope_id(&self) -> ScopeId {
        self.scope_id
    }

    /// The provider this scope was created from
    pub fn provider(&self) -> &ServiceProvider {
        &self.provider
    }

    /// Resolve a service within this scope
    pub fn get_service<T>(&self) -> Result<Option<Arc<T>>, CoreError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolver().get_service::<T>()
    }

    /// Resolve a service within this scope, failing if it isn't registered
    pub fn get_required_service<T>(&self) -> Result<Arc<T>, CoreError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolver().get_required_service::<T>()
    }

    /// Number of scoped instances created so far
    pub fn service_count(&self) -> usize {
        self.instances.read().map(|i| i.len()).unwrap_or(0)
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.provider, Some(self))
    }

    /// Get or create the scoped instance for `service_id`
    pub(crate) fn scoped_instance(
        &self,
        service_id: &ServiceId,
        factory: &ServiceFactory,
    ) -> Result<ErasedInstance, CoreError> {
        {
            let instances = self.instances.read().map_err(|_| CoreError::lock("scoped_instances"))?;
            if let Some(instance) = instances.get(service_id) {
                return Ok(instance.clone());
            }
        }

        // Build outside the lock: the factory may resolve other scoped services.
        let instance = factory(&self.resolver())?;

        let mut instances = self.instances.write().map_err(|_| CoreError::lock("scoped_instances"))?;
        Ok(instances.entry(*service_id).or_insert(instance).clone())
    }
}

impl std::fmt::Debug for ProviderScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderScope")
            .field("scope_id", &self.scope_id)
            .field("service_count", &self.service_count())
            .finish()
    }
}

impl Drop for ProviderScope {
    fn drop(&mut self) {
        tracing::trace!(
            scope_id = %self.scope_id,
            instances = self.service_count(),
            "Releasing provider scope"
        );
    }
}
