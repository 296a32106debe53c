pub mod collection;
pub mod descriptor;
pub mod provider;
pub mod scope;

pub use collection::ServiceCollection;
pub use descriptor::{ErasedInstance, ServiceActivation, ServiceDescriptor, ServiceFactory, ServiceId};
pub use provider::{Resolver, ServiceProvider};
pub use scope::{ProviderScope, ScopeId, ServiceScope};
