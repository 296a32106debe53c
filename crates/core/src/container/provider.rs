use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::container::descriptor::{
    ErasedInstance, ServiceActivation, ServiceDescriptor, ServiceFactory, ServiceId,
};
use crate::container::scope::{ProviderScope, ServiceScope};
use crate::errors::CoreError;

struct ProviderInner {
    descriptors: HashMap<ServiceId, ServiceDescriptor>,
    singletons: RwLock<HashMap<ServiceId, ErasedInstance>>,
}

/// Built container that resolves services.
///
/// Cloning is cheap; clones share registrations and singleton instances.
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

impl ServiceProvider {
    /// Build a provider from descriptors. When a type is registered more than once the
    /// last registration wins.
    pub(crate) fn from_descriptors(descriptors: Vec<ServiceDescriptor>) -> Self {
        let mut by_id = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            by_id.insert(descriptor.service_id, descriptor);
        }

        Self {
            inner: Arc::new(ProviderInner {
                descriptors: by_id,
                singletons: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Resolve a service from the root of the container.
    ///
    /// Returns `Ok(None)` when the type is not registered. Scoped services need a
    /// scope, see [`ServiceProvider::create_scope`].
    pub fn get_service<T>(&self) -> Result<Option<Arc<T>>, CoreError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Resolver::new(self, None).get_service::<T>()
    }

    /// Resolve a service from the root, failing if it isn't registered
    pub fn get_required_service<T>(&self) -> Result<Arc<T>, CoreError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Resolver::new(self, None).get_required_service::<T>()
    }

    /// Create a new resolution scope
    pub fn create_scope(&self) -> ProviderScope {
        ProviderScope::new(self.clone())
    }

    /// Check if a service type is registered
    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.inner.descriptors.contains_key(&ServiceId::of::<T>())
    }

    /// Lifetime of the registration for `T`, if any
    pub fn lifetime_of<T: ?Sized + 'static>(&self) -> Option<ServiceScope> {
        self.descriptor(&ServiceId::of::<T>()).map(|d| d.lifetime)
    }

    /// Get the number of registered services
    pub fn service_count(&self) -> usize {
        self.inner.descriptors.len()
    }

    fn descriptor(&self, service_id: &ServiceId) -> Option<&ServiceDescriptor> {
        self.inner.descriptors.get(service_id)
    }

    fn singleton_instance(
        &self,
        service_id: &ServiceId,
        factory: &ServiceFactory,
    ) -> Result<ErasedInstance, CoreError> {
        {
            let singletons = self
                .inner
                .singletons
                .read()
                .map_err(|_| CoreError::lock("singleton_instances"))?;
            if let Some(instance) = singletons.get(service_id) {
                return Ok(instance.clone());
            }
        }

        // Singletons only ever see the root so they can't capture scoped services.
        let instance = factory(&Resolver::new(self, None))?;

        let mut singletons = self
            .inner
            .singletons
            .write()
            .map_err(|_| CoreError::lock("singleton_instances"))?;
        Ok(singletons.entry(*service_id).or_insert(instance).clone())
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("service_count", &self.service_count())
            .finish()
    }
}

/// Resolution context handed to factories.
///
/// Carries the provider and, when resolving inside a scope, the scope itself.
pub struct Resolver<'a> {
    provider: &'a ServiceProvider,
    scope: Option<&'a ProviderScope>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(provider: &'a ServiceProvider, scope: Option<&'a ProviderScope>) -> Self {
        Self { provider, scope }
    }

    /// The provider being resolved from
    pub fn provider(&self) -> &'a ServiceProvider {
        self.provider
    }

    /// The active scope, if resolution happens inside one
    pub fn scope(&self) -> Option<&'a ProviderScope> {
        self.scope
    }

    /// Resolve a service, returning `Ok(None)` when it isn't registered
    pub fn get_service<T>(&self) -> Result<Option<Arc<T>>, CoreError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let service_id = ServiceId::of::<T>();
        match self.resolve_erased(&service_id)? {
            Some(erased) => downcast::<T>(&service_id, &erased).map(Some),
            None => Ok(None),
        }
    }

    /// Resolve a service, failing if it isn't registered
    pub fn get_required_service<T>(&self) -> Result<Arc<T>, CoreError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_service::<T>()?
            .ok_or_else(|| CoreError::service_not_found(std::any::type_name::<T>()))
    }

    fn resolve_erased(&self, service_id: &ServiceId) -> Result<Option<ErasedInstance>, CoreError> {
        let Some(descriptor) = self.provider.descriptor(service_id) else {
            return Ok(None);
        };

        let factory = match &descriptor.activation {
            ServiceActivation::Instance(instance) => return Ok(Some(instance.clone())),
            ServiceActivation::Factory(factory) => factory,
        };

        let instance = match descriptor.lifetime {
            ServiceScope::Singleton => self.provider.singleton_instance(service_id, factory)?,
            ServiceScope::Transient => factory(self)?,
            ServiceScope::Scoped => match self.scope {
                Some(scope) => scope.scoped_instance(service_id, factory)?,
                None => {
                    return Err(CoreError::ScopeRequired {
                        service_type: service_id.type_name().to_string(),
                    })
                }
            },
        };

        Ok(Some(instance))
    }
}

fn downcast<T>(service_id: &ServiceId, erased: &ErasedInstance) -> Result<Arc<T>, CoreError>
where
    T: ?Sized + Send + Sync + 'static,
{
    erased
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or_else(|| CoreError::ServiceTypeMismatch {
            service_type: service_id.type_name().to_string(),
            expected: std::any::type_name::<T>(),
        })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::container::ServiceCollection;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[derive(Debug)]
    struct Counter(usize);

    #[test]
    fn test_resolve_trait_object_instance() {
        let mut services = ServiceCollection::new();
        services.add_singleton_instance::<dyn Greeter>(Arc::new(English));
        let provider = services.build();

        let greeter = provider.get_required_service::<dyn Greeter>().unwrap();
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn test_unregistered_service_is_none() {
        let provider = ServiceCollection::new().build();

        assert!(provider.get_service::<Counter>().unwrap().is_none());
        assert!(provider.get_required_service::<Counter>().unwrap_err().is_not_found());
    }

    #[test]
    fn test_singleton_factory_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let mut services = ServiceCollection::new();
        services.add_singleton(move |_| Ok(Arc::new(Counter(seen.fetch_add(1, Ordering::SeqCst)))));
        let provider = services.build();

        let first = provider.get_required_service::<Counter>().unwrap();
        let second = provider.create_scope().get_required_service::<Counter>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transient_factory_runs_every_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let mut services = ServiceCollection::new();
        services.add_transient(move |_| Ok(Arc::new(Counter(seen.fetch_add(1, Ordering::SeqCst)))));
        let provider = services.build();

        let first = provider.get_required_service::<Counter>().unwrap();
        let second = provider.get_required_service::<Counter>().unwrap();

        assert_eq!(first.0, 0);
        assert_eq!(second.0, 1);
    }

    #[test]
    fn test_scoped_service_requires_scope() {
        let mut services = ServiceCollection::new();
        services.add_scoped(|_| Ok(Arc::new(Counter(0))));
        let provider = services.build();

        let error = provider.get_service::<Counter>().unwrap_err();
        assert!(matches!(error, CoreError::ScopeRequired { .. }));
    }

    #[test]
    fn test_scoped_instances_are_shared_within_a_scope_only() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let mut services = ServiceCollection::new();
        services.add_scoped(move |_| Ok(Arc::new(Counter(seen.fetch_add(1, Ordering::SeqCst)))));
        let provider = services.build();

        let scope_a = provider.create_scope();
        let a1 = scope_a.get_required_service::<Counter>().unwrap();
        let a2 = scope_a.get_required_service::<Counter>().unwrap();
        assert!(Arc::ptr_eq(&a1, &a2));
        assert_eq!(scope_a.service_count(), 1);

        let scope_b = provider.create_scope();
        let b1 = scope_b.get_required_service::<Counter>().unwrap();
        assert!(!Arc::ptr_eq(&a1, &b1));
        assert_ne!(scope_a.scope_id(), scope_b.scope_id());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_factories_resolve_their_dependencies() {
        let mut services = ServiceCollection::new();
        services.add_singleton_instance::<dyn Greeter>(Arc::new(English));
        services.add_transient(|resolver| {
            let greeter = resolver.get_required_service::<dyn Greeter>()?;
            Ok(Arc::new(greeter.greet().len()))
        });
        let provider = services.build();

        assert_eq!(*provider.get_required_service::<usize>().unwrap(), 5);
    }

    #[test]
    fn test_last_registration_wins() {
        let mut services = ServiceCollection::new();
        services.add_singleton_instance(Arc::new(Counter(1)));
        services.add_singleton_instance(Arc::new(Counter(2)));
        let provider = services.build();

        assert_eq!(provider.get_required_service::<Counter>().unwrap().0, 2);
        assert_eq!(provider.service_count(), 1);
        assert_eq!(provider.lifetime_of::<Counter>(), Some(ServiceScope::Singleton));
    }
}
