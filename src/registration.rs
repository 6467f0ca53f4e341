//! One-shot driver registration.
//!
//! The composition root builds a [`BindingDescriptor`] and a
//! [`ComponentName`] and hands both to [`register`] once at startup:
//!
//! ```rust,ignore
//! let binding = Arc::new(HdaCodecBinding::new(registry, requester, options));
//! let descriptor = BindingDescriptor::new(DRIVER_NAME, binding, DRIVER_VERSION);
//! register(&framework, descriptor, ComponentName::default())?;
//! ```
//!
//! A rejected registration leaves the driver unreachable, so callers are
//! expected to abort on `RegistrationFailed`.

use crate::descriptor::BindingDescriptor;
use crate::error::{BindingError, BindingResult};
use crate::naming::ComponentName;
use thiserror::Error;

/// Why the framework refused to install a driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstallError {
    /// A driver with the same name is already installed
    #[error("driver '{0}' is already installed")]
    Duplicate(String),

    /// Any other framework-side refusal
    #[error("framework rejected the driver: {0}")]
    Rejected(String),
}

/// Framework-side driver registry that accepts binding descriptors.
pub trait RegistrationSink {
    /// Install `descriptor` and its naming collaborator.
    fn install(
        &self,
        descriptor: BindingDescriptor,
        naming: ComponentName,
    ) -> Result<(), InstallError>;
}

/// Publish `descriptor` into the framework's driver registry.
///
/// # Errors
/// `RegistrationFailed` if the sink rejects the install.
pub fn register(
    sink: &dyn RegistrationSink,
    descriptor: BindingDescriptor,
    naming: ComponentName,
) -> BindingResult<()> {
    let driver = descriptor.driver_name().to_string();
    let version = descriptor.version();

    sink.install(descriptor, naming).map_err(|err| {
        tracing::error!(%driver, error = %err, "driver registration rejected");
        BindingError::RegistrationFailed(err)
    })?;

    tracing::info!(%driver, version = format_args!("{:#x}", version), "driver registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{BindingOptions, HdaCodecBinding};
    use crate::descriptor::DRIVER_VERSION;
    use crate::handle::RequesterId;
    use crate::mock::{InMemoryDriverRegistry, InMemoryRegistry};
    use crate::naming::DRIVER_NAME;
    use std::sync::Arc;

    fn descriptor() -> BindingDescriptor {
        let binding = Arc::new(HdaCodecBinding::new(
            Arc::new(InMemoryRegistry::new()),
            RequesterId::new(1),
            BindingOptions::default(),
        ));
        BindingDescriptor::new(DRIVER_NAME, binding, DRIVER_VERSION)
    }

    #[test]
    fn test_register_installs_descriptor() {
        let framework = InMemoryDriverRegistry::new();
        register(&framework, descriptor(), ComponentName::default()).unwrap();

        let installed = framework.get(DRIVER_NAME).unwrap();
        assert_eq!(installed.version(), DRIVER_VERSION);
        assert_eq!(installed.image_handle(), None);
        assert_eq!(installed.binding_handle(), None);
        assert_eq!(
            framework.naming(DRIVER_NAME).unwrap().driver_name("eng"),
            Some(DRIVER_NAME)
        );
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let framework = InMemoryDriverRegistry::new();
        register(&framework, descriptor(), ComponentName::default()).unwrap();

        let err = register(&framework, descriptor(), ComponentName::default()).unwrap_err();
        assert!(matches!(
            err,
            BindingError::RegistrationFailed(InstallError::Duplicate(ref name)) if name == DRIVER_NAME
        ));
        assert_eq!(framework.len(), 1);
    }
}
