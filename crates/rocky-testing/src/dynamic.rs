//! Swappable service instances
//!
//! A [`DynamicServiceManager<T>`] registers `T` so that every resolution reads the
//! current instance of a long-lived [`DynamicInstance<T>`] holder. Tests swap that
//! instance without rebuilding the provider.

use std::sync::{Arc, RwLock};

use rocky_core::{CoreError, ServiceCollection, ServiceId, ServiceProvider};

use crate::{TestError, TestResult};

/// Holder of the default and current instance of a swappable service
pub struct DynamicInstance<T: ?Sized> {
    default: Arc<T>,
    current: RwLock<Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> DynamicInstance<T> {
    pub fn new(default: Arc<T>) -> Self {
        Self {
            current: RwLock::new(default.clone()),
            default,
        }
    }

    /// The instance resolutions currently return
    pub fn get(&self) -> Result<Arc<T>, CoreError> {
        let current = self.current.read().map_err(|_| CoreError::lock(lock_name::<T>()))?;
        Ok(current.clone())
    }

    /// Swap the instance returned from now on
    pub fn set(&self, instance: Arc<T>) -> Result<(), CoreError> {
        let mut current = self.current.write().map_err(|_| CoreError::lock(lock_name::<T>()))?;
        *current = instance;
        Ok(())
    }

    /// Go back to the default instance
    pub fn reset(&self) -> Result<(), CoreError> {
        self.set(self.default.clone())
    }

    pub fn default_instance(&self) -> Arc<T> {
        self.default.clone()
    }

    /// Look up the holder for `T` in a built provider
    pub fn from_provider(provider: &ServiceProvider) -> TestResult<Arc<Self>> {
        provider
            .get_service::<Self>()?
            .ok_or_else(TestError::not_registered::<T>)
    }
}

impl<T: ?Sized> std::fmt::Debug for DynamicInstance<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicInstance")
            .field("service", &std::any::type_name::<T>())
            .finish()
    }
}

fn lock_name<T: ?Sized>() -> String {
    format!("DynamicInstance<{}>", std::any::type_name::<T>())
}

/// A swappable registration that can be applied to a service collection
pub trait DynamicServiceDescriptor: Send + Sync {
    /// The overridable service type
    fn service_id(&self) -> ServiceId;

    /// Register the holder and the redirecting factory, replacing earlier registrations
    fn add_service_descriptor(&self, services: &mut ServiceCollection);
}

/// Registers `T` as a swappable service starting from `default`
pub struct DynamicServiceManager<T: ?Sized> {
    default: Arc<T>,
}

impl<T: ?Sized + Send + Sync + 'static> DynamicServiceManager<T> {
    pub fn new(default: Arc<T>) -> Self {
        Self { default }
    }

    pub fn default_instance(&self) -> Arc<T> {
        self.default.clone()
    }
}

impl<T: ?Sized + Send + Sync + 'static> DynamicServiceDescriptor for DynamicServiceManager<T> {
    fn service_id(&self) -> ServiceId {
        ServiceId::of::<T>()
    }

    // T is transient so a swap is seen by resolutions made before it in other scopes.
    fn add_service_descriptor(&self, services: &mut ServiceCollection) {
        let removed = services.remove_all::<T>() + services.remove_all::<DynamicInstance<T>>();

        let holder = Arc::new(DynamicInstance::new(self.default.clone()));
        services.add_singleton_instance(holder.clone());
        services.add_transient::<T, _>(move |_| holder.get());

        tracing::debug!(
            service = std::any::type_name::<T>(),
            removed,
            "Registered dynamic service"
        );
    }
}
