use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::container::provider::Resolver;
use crate::container::scope::ServiceScope;
use crate::errors::CoreError;

/// Type-erased service instance. Always holds an `Arc<T>` for the service type `T`,
/// which lets unsized services (`dyn Trait`) travel through the container.
pub type ErasedInstance = Arc<dyn Any + Send + Sync>;

/// Type-erased factory invoked by the provider when a service must be built
pub type ServiceFactory =
    Arc<dyn Fn(&Resolver<'_>) -> Result<ErasedInstance, CoreError> + Send + Sync>;

/// Service identifier: the registered key type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceId {
    pub type_id: TypeId,
    pub type_name: &'static str,
}

impl ServiceId {
    /// Create a new service ID for a type
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}

/// How the provider obtains an instance for a descriptor
#[derive(Clone)]
pub enum ServiceActivation {
    /// A pre-built instance, returned as-is regardless of lifetime
    Instance(ErasedInstance),
    /// A factory invoked according to the descriptor's lifetime
    Factory(ServiceFactory),
}

impl std::fmt::Debug for ServiceActivation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceActivation::Instance(_) => write!(f, "Instance(<instance>)"),
            ServiceActivation::Factory(_) => write!(f, "Factory(<factory_fn>)"),
        }
    }
}

/// Service descriptor containing all metadata for a registration
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// Service identifier
    pub service_id: ServiceId,
    /// Service lifetime
    pub lifetime: ServiceScope,
    /// Strategy for creating instances
    pub activation: ServiceActivation,
}

impl ServiceDescriptor {
    /// Register a fixed instance as a singleton
    pub fn singleton_instance<T>(instance: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self {
            service_id: ServiceId::of::<T>(),
            lifetime: ServiceScope::Singleton,
            activation: ServiceActivation::Instance(Arc::new(instance)),
        }
    }

    /// Singleton built lazily on first resolution
    pub fn singleton<T, F>(factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, CoreError> + Send + Sync + 'static,
    {
        Self::from_factory(ServiceScope::Singleton, factory)
    }

    /// One instance per provider scope
    pub fn scoped<T, F>(factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, CoreError> + Send + Sync + 'static,
    {
        Self::from_factory(ServiceScope::Scoped, factory)
    }

    /// New instance on every resolution
    pub fn transient<T, F>(factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, CoreError> + Send + Sync + 'static,
    {
        Self::from_factory(ServiceScope::Transient, factory)
    }

    /// Build a descriptor from a typed factory and an explicit lifetime
    pub fn from_factory<T, F>(lifetime: ServiceScope, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, CoreError> + Send + Sync + 'static,
    {
        let erased: ServiceFactory = Arc::new(move |resolver: &Resolver<'_>| {
            let instance = factory(resolver)?;
            Ok(Arc::new(instance) as ErasedInstance)
        });

        Self {
            service_id: ServiceId::of::<T>(),
            lifetime,
            activation: ServiceActivation::Factory(erased),
        }
    }

    /// Override the lifetime of this descriptor
    pub fn with_lifetime(mut self, lifetime: ServiceScope) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Check whether this descriptor registers the given type
    pub fn is_for<T: ?Sized + 'static>(&self) -> bool {
        self.service_id == ServiceId::of::<T>()
    }

    /// Returns true if the descriptor carries a pre-built instance
    pub fn is_instance(&self) -> bool {
        matches!(self.activation, ServiceActivation::Instance(_))
    }
}
