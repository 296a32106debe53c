//! Data-access overrides
//!
//! A [`DataServiceManager`] registers a data context for the test host and
//! cleans up after tests. Each manager states which [`DataCapability`] it
//! supports; calling anything else returns [`TestError::NotImplemented`].

use std::sync::Arc;

use async_trait::async_trait;
use rocky_core::{CoreError, ServiceCollection, ServiceDescriptor, ServiceId, ServiceProvider, ServiceScope};
use rocky_orm::{DbContext, DbContextOptions};

use crate::database::{wipe_all_data, WipeOptions};
use crate::{TestError, TestResult};

/// Operations a data manager may support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataCapability {
    RegisterBindings,
    CleanupData,
    CleanupStructure,
}

impl DataCapability {
    pub fn operation(&self) -> &'static str {
        match self {
            DataCapability::RegisterBindings => "add_service_descriptor",
            DataCapability::CleanupData => "cleanup_data",
            DataCapability::CleanupStructure => "cleanup_structure",
        }
    }
}

/// Registers a data context and cleans persisted state.
///
/// Every operation defaults to [`TestError::NotImplemented`]; implementors
/// override the ones they list in [`DataServiceManager::supports`].
#[async_trait]
pub trait DataServiceManager: Send + Sync {
    /// Name used in errors and logs
    fn name(&self) -> String;

    /// Drop the schema when the web app is disposed
    fn clean_structure_on_exit(&self) -> bool {
        false
    }

    fn supports(&self, capability: DataCapability) -> bool;

    fn add_service_descriptor(&self, _services: &mut ServiceCollection) -> TestResult<()> {
        Err(self.unsupported(DataCapability::RegisterBindings))
    }

    async fn cleanup_data(&self, _provider: &ServiceProvider) -> TestResult<()> {
        Err(self.unsupported(DataCapability::CleanupData))
    }

    async fn cleanup_structure(&self, _provider: &ServiceProvider) -> TestResult<()> {
        Err(self.unsupported(DataCapability::CleanupStructure))
    }

    fn unsupported(&self, capability: DataCapability) -> TestError {
        TestError::not_implemented(self.name(), capability.operation())
    }
}

type OptionsAction<I> = Arc<dyn Fn(&mut DbContextOptions<I>) + Send + Sync>;

/// Registers a relational context and its options, and wipes its tables on cleanup.
///
/// The context is built as `I` and also registered under `C`. By default both are
/// the same type; [`DbContextServiceManager::with_implementation`] registers an
/// abstraction such as a `dyn` trait that resolves to the context `I`.
pub struct DbContextServiceManager<C: ?Sized, I = C> {
    options_action: Option<OptionsAction<I>>,
    upcast: fn(Arc<I>) -> Arc<C>,
    clean_structure_on_exit: bool,
    context_lifetime: ServiceScope,
    options_lifetime: ServiceScope,
    wipe_options: WipeOptions,
}

impl<C: DbContext> DbContextServiceManager<C> {
    /// Context and options are scoped; options come from the environment
    pub fn new() -> Self {
        Self::with_implementation(|context| context)
    }
}

impl<C, I> DbContextServiceManager<C, I>
where
    C: ?Sized + Send + Sync + 'static,
    I: DbContext,
{
    /// Resolve `C` through a context built as `I`
    pub fn with_implementation(upcast: fn(Arc<I>) -> Arc<C>) -> Self {
        Self {
            options_action: None,
            upcast,
            clean_structure_on_exit: false,
            context_lifetime: ServiceScope::Scoped,
            options_lifetime: ServiceScope::Scoped,
            wipe_options: WipeOptions::default(),
        }
    }

    /// Adjust the options after they are read from the environment
    pub fn with_options<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut DbContextOptions<I>) + Send + Sync + 'static,
    {
        self.options_action = Some(Arc::new(action));
        self
    }

    pub fn with_clean_structure_on_exit(mut self, clean: bool) -> Self {
        self.clean_structure_on_exit = clean;
        self
    }

    pub fn with_context_lifetime(mut self, lifetime: ServiceScope) -> Self {
        self.context_lifetime = lifetime;
        self
    }

    pub fn with_options_lifetime(mut self, lifetime: ServiceScope) -> Self {
        self.options_lifetime = lifetime;
        self
    }

    pub fn with_wipe_options(mut self, options: WipeOptions) -> Self {
        self.wipe_options = options;
        self
    }

    pub fn context_lifetime(&self) -> ServiceScope {
        self.context_lifetime
    }

    pub fn options_lifetime(&self) -> ServiceScope {
        self.options_lifetime
    }

    pub fn wipe_options(&self) -> &WipeOptions {
        &self.wipe_options
    }

    fn has_abstraction() -> bool {
        ServiceId::of::<C>() != ServiceId::of::<I>()
    }
}

impl<C: DbContext> Default for DbContextServiceManager<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C, I> DataServiceManager for DbContextServiceManager<C, I>
where
    C: ?Sized + Send + Sync + 'static,
    I: DbContext,
{
    fn name(&self) -> String {
        if Self::has_abstraction() {
            format!(
                "DbContextServiceManager<{}, {}>",
                std::any::type_name::<C>(),
                std::any::type_name::<I>()
            )
        } else {
            format!("DbContextServiceManager<{}>", std::any::type_name::<I>())
        }
    }

    fn clean_structure_on_exit(&self) -> bool {
        self.clean_structure_on_exit
    }

    fn supports(&self, capability: DataCapability) -> bool {
        matches!(capability, DataCapability::RegisterBindings | DataCapability::CleanupData)
    }

    fn add_service_descriptor(&self, services: &mut ServiceCollection) -> TestResult<()> {
        services.remove_all::<C>();
        services.remove_all::<I>();
        services.remove_all::<DbContextOptions<I>>();

        let action = self.options_action.clone();
        services.add(ServiceDescriptor::from_factory::<DbContextOptions<I>, _>(
            self.options_lifetime,
            move |_| {
                let mut options = DbContextOptions::<I>::from_env();
                if let Some(action) = &action {
                    action(&mut options);
                }
                Ok(Arc::new(options))
            },
        ));

        services.add(ServiceDescriptor::from_factory::<I, _>(self.context_lifetime, |resolver| {
            let options = resolver.get_required_service::<DbContextOptions<I>>()?;
            let context = I::from_options(&options)
                .map_err(|e| CoreError::initialization_failed(std::any::type_name::<I>(), e))?;
            Ok(Arc::new(context))
        }));

        if Self::has_abstraction() {
            let upcast = self.upcast;
            services.add(ServiceDescriptor::from_factory::<C, _>(self.context_lifetime, move |resolver| {
                Ok(upcast(resolver.get_required_service::<I>()?))
            }));
        }

        tracing::debug!(
            service = std::any::type_name::<C>(),
            context = std::any::type_name::<I>(),
            lifetime = %self.context_lifetime,
            "Registered data context"
        );
        Ok(())
    }

    async fn cleanup_data(&self, provider: &ServiceProvider) -> TestResult<()> {
        let scope = provider.create_scope();
        let context = scope.get_required_service::<I>()?;
        wipe_all_data(context.as_ref(), &self.wipe_options).await
    }
}

/// Document-store manager. No operation is supported yet.
#[derive(Debug, Clone, Default)]
pub struct MongoDbServiceManager {
    clean_structure_on_exit: bool,
}

impl MongoDbServiceManager {
    pub fn new(clean_structure_on_exit: bool) -> Self {
        Self {
            clean_structure_on_exit,
        }
    }
}

#[async_trait]
impl DataServiceManager for MongoDbServiceManager {
    fn name(&self) -> String {
        "MongoDbServiceManager".to_string()
    }

    fn clean_structure_on_exit(&self) -> bool {
        self.clean_structure_on_exit
    }

    fn supports(&self, _capability: DataCapability) -> bool {
        false
    }
}
