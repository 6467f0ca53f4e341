//! Error types for the codec binding.
//!
//! `BindingError` is the single error type returned by every binding entry
//! point. Using the `thiserror` crate, it keeps the underlying cause attached
//! so diagnostics can print the full chain.
//!
//! ## Error Taxonomy
//!
//! - **`LeaseDenied`**: the registry refused a capability (already owned, or
//!   not exposed by the controller). Never fatal; the driver declines the
//!   controller.
//! - **`CommandFailed`**: the identification handshake failed at the
//!   transport level. Fatal for probe, logged and tolerated during attach.
//! - **`Unsupported`**: the outward signal from probe/attach. Wraps whichever
//!   of the two errors above caused the controller to be declined.
//! - **`NotBound`**: detach was asked to unwind a controller this binding is
//!   not attached to.
//! - **`InUse`**: probe or attach found the controller already probing,
//!   attaching, bound or detaching in this binding. Declined before any
//!   lease is requested.
//! - **`RegistrationFailed`**: the framework rejected the driver at startup.
//!   Callers must treat it as fatal.

use crate::binding::BindingState;
use crate::capability::{CapabilityKind, TransportError};
use crate::handle::ControllerHandle;
use crate::registration::InstallError;
use crate::registry::RegistryError;
use thiserror::Error;

/// Convenience alias for results using the binding error type.
pub type BindingResult<T> = std::result::Result<T, BindingError>;

/// Errors produced by the binding lifecycle.
#[derive(Error, Debug)]
pub enum BindingError {
    /// The registry refused to lease a capability.
    #[error("{kind} lease on {handle} denied: {source}")]
    LeaseDenied {
        /// Controller the lease was requested for
        handle: ControllerHandle,
        /// Capability that was requested
        kind: CapabilityKind,
        /// Registry's reason
        #[source]
        source: RegistryError,
    },

    /// The identification command failed in the transport.
    #[error("identification command failed: {0}")]
    CommandFailed(#[from] TransportError),

    /// The controller was declined by probe or attach.
    #[error("controller {handle} is not supported: {source}")]
    Unsupported {
        /// Controller that was declined
        handle: ControllerHandle,
        /// What made the driver decline it
        #[source]
        source: Box<BindingError>,
    },

    /// Detach was called for a controller that is not bound.
    #[error("controller {0} is not bound to this driver")]
    NotBound(ControllerHandle),

    /// This binding already has the controller in a non-idle state.
    #[error("controller {handle} is already in use by this driver ({state:?})")]
    InUse {
        /// Controller that was requested
        handle: ControllerHandle,
        /// State the binding holds it in
        state: BindingState,
    },

    /// The enumeration framework rejected driver registration.
    #[error("driver registration failed: {0}")]
    RegistrationFailed(#[from] InstallError),
}

impl BindingError {
    /// Wrap `cause` as the outward `Unsupported` signal for `handle`
    pub fn unsupported(handle: ControllerHandle, cause: BindingError) -> Self {
        Self::Unsupported {
            handle,
            source: Box::new(cause),
        }
    }

    /// True for the outward `Unsupported` signal
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Innermost cause behind an `Unsupported` wrapper
    pub fn root_cause(&self) -> &BindingError {
        match self {
            Self::Unsupported { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
