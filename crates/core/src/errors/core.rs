use thiserror::Error;

/// Core error type for the rocky container
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Service not found: {service_type}")]
    ServiceNotFound { service_type: String },

    #[error("Scoped service '{service_type}' cannot be resolved without a scope")]
    ScopeRequired { service_type: String },

    #[error("Registered instance for '{service_type}' is not a '{expected}'")]
    ServiceTypeMismatch {
        service_type: String,
        expected: &'static str,
    },

    #[error("Invalid service scope: {scope}")]
    InvalidServiceScope { scope: String },

    #[error("Lock error on resource: {resource}")]
    LockError { resource: String },

    #[error("Service initialization failed for '{service_type}': {message}")]
    ServiceInitializationFailed {
        service_type: String,
        message: String,
    },
}

impl CoreError {
    /// Create a new service not found error
    pub fn service_not_found(service_type: impl Into<String>) -> Self {
        Self::ServiceNotFound {
            service_type: service_type.into(),
        }
    }

    /// Create a new lock error for the named resource
    pub fn lock(resource: impl Into<String>) -> Self {
        Self::LockError {
            resource: resource.into(),
        }
    }

    /// Wrap a failure raised while a factory was building a service
    pub fn initialization_failed(
        service_type: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::ServiceInitializationFailed {
            service_type: service_type.into(),
            message: message.to_string(),
        }
    }

    /// Returns true if the error means the service simply isn't registered
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ServiceNotFound { .. })
    }
}
