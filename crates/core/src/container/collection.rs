use std::sync::Arc;

use crate::container::descriptor::{ServiceDescriptor, ServiceId};
use crate::container::provider::{Resolver, ServiceProvider};
use crate::container::scope::ServiceScope;
use crate::errors::CoreError;

/// Ordered list of service registrations, mutable until [`ServiceCollection::build`]
#[derive(Debug, Clone, Default)]
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
}

impl ServiceCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor
    pub fn add(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        tracing::trace!(
            service = descriptor.service_id.type_name(),
            lifetime = %descriptor.lifetime,
            "Adding service registration"
        );
        self.descriptors.push(descriptor);
        self
    }

    /// Register a fixed singleton instance
    pub fn add_singleton_instance<T>(&mut self, instance: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::singleton_instance(instance))
    }

    /// Register a lazily built singleton
    pub fn add_singleton<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, CoreError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::singleton(factory))
    }

    /// Register a scoped service
    pub fn add_scoped<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, CoreError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::scoped(factory))
    }

    /// Register a transient service
    pub fn add_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, CoreError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::transient(factory))
    }

    /// Remove the first registration for the descriptor's type (if any) and append
    /// the descriptor.
    pub fn replace(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        if let Some(position) = self.position(&descriptor.service_id) {
            self.descriptors.remove(position);
        }
        self.add(descriptor)
    }

    /// Like [`ServiceCollection::replace`], but the new registration inherits the
    /// lifetime of the one it replaces.
    pub fn replace_preserving_lifetime(&mut self, mut descriptor: ServiceDescriptor) -> &mut Self {
        if let Some(position) = self.position(&descriptor.service_id) {
            let existing = self.descriptors.remove(position);
            descriptor.lifetime = existing.lifetime;
        }
        self.add(descriptor)
    }

    /// Remove every registration for `T`, returning how many were removed
    pub fn remove_all<T: ?Sized + 'static>(&mut self) -> usize {
        self.remove_all_by_id(&ServiceId::of::<T>())
    }

    /// Remove every registration for a service id
    pub fn remove_all_by_id(&mut self, service_id: &ServiceId) -> usize {
        let before = self.descriptors.len();
        self.descriptors.retain(|d| d.service_id != *service_id);
        before - self.descriptors.len()
    }

    /// Check if a service is registered
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.position(&ServiceId::of::<T>()).is_some()
    }

    /// The registration that will be effective for `T` (the last one added)
    pub fn descriptor<T: ?Sized + 'static>(&self) -> Option<&ServiceDescriptor> {
        let service_id = ServiceId::of::<T>();
        self.descriptors.iter().rev().find(|d| d.service_id == service_id)
    }

    /// Lifetime of the effective registration for `T`
    pub fn lifetime_of<T: ?Sized + 'static>(&self) -> Option<ServiceScope> {
        self.descriptor::<T>().map(|d| d.lifetime)
    }

    /// All registrations in insertion order
    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    /// Get the number of registrations
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Freeze the registrations into a provider
    pub fn build(self) -> ServiceProvider {
        tracing::debug!(registrations = self.descriptors.len(), "Building service provider");
        ServiceProvider::from_descriptors(self.descriptors)
    }

    fn position(&self, service_id: &ServiceId) -> Option<usize> {
        self.descriptors.iter().position(|d| d.service_id == *service_id)
    }
}
