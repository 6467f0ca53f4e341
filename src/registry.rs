//! Enumeration registry contract.
//!
//! The registry owns the per-(controller, capability) lease table shared by
//! every driver in the system. This crate only consumes it: each open/close
//! is a direct call into the registry, which is the single authority on who
//! holds what. Implementations must treat `open_exclusive` as atomic.

use crate::capability::{Capability, CapabilityKind};
use crate::handle::{ControllerHandle, RequesterId};
use thiserror::Error;

/// Why the registry refused to open a capability.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Another holder already has the capability open
    #[error("capability is already owned")]
    AlreadyOwned,

    /// The controller does not expose this capability
    #[error("capability is not supported by the controller")]
    NotSupported,
}

/// Shared registry of controller capabilities.
pub trait EnumerationRegistry: Send + Sync {
    /// Open `kind` on `handle` exclusively for `requester`.
    ///
    /// At most one requester may hold a given capability of a given
    /// controller at a time. Whether the current holder may open it again
    /// is up to the implementation, and opens are not counted: a single
    /// `close` by the holder releases the capability. Callers must not open
    /// a capability they already hold.
    fn open_exclusive(
        &self,
        handle: ControllerHandle,
        kind: CapabilityKind,
        requester: RequesterId,
    ) -> Result<Capability, RegistryError>;

    /// Close a capability previously opened by `requester`.
    ///
    /// Must be a no-op when `requester` does not currently hold it.
    fn close(&self, handle: ControllerHandle, kind: CapabilityKind, requester: RequesterId);
}
