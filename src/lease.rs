//! Scoped, exclusive leases over controller capabilities.
//!
//! A [`Lease`] is an RAII guard: acquiring it opens the capability in the
//! registry, dropping it closes it again. Every exit path of probe and
//! attach therefore releases exactly the leases it actually took, with no
//! explicit cleanup labels.
//!
//! ```rust,ignore
//! let command = CommandLease::acquire(&registry, handle, requester, LeaseMode::Trial)?;
//! let identity = query_identity(&*command)?;
//! // `command` closes here, on success and on the `?` path alike
//! ```

use crate::capability::{Capability, CapabilityKind, CodecCommand, LocationPath};
use crate::error::{BindingError, BindingResult};
use crate::handle::{ControllerHandle, RequesterId};
use crate::registry::{EnumerationRegistry, RegistryError};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// How the holder intends to use a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseMode {
    /// Short-lived hold for a compatibility check
    Trial,
    /// Held for the lifetime of an attachment
    Operational,
}

/// Capability interface type that can be leased.
pub trait LeaseTarget: Send + Sync {
    /// Registry kind tag for this interface
    const KIND: CapabilityKind;

    /// Take the interface out of a registry capability, if the kind matches
    fn extract(capability: Capability) -> Option<Arc<Self>>;
}

impl LeaseTarget for dyn CodecCommand {
    const KIND: CapabilityKind = CapabilityKind::CodecCommand;

    fn extract(capability: Capability) -> Option<Arc<Self>> {
        match capability {
            Capability::CodecCommand(codec) => Some(codec),
            Capability::LocationPath(_) => None,
        }
    }
}

impl LeaseTarget for dyn LocationPath {
    const KIND: CapabilityKind = CapabilityKind::LocationPath;

    fn extract(capability: Capability) -> Option<Arc<Self>> {
        match capability {
            Capability::LocationPath(path) => Some(path),
            Capability::CodecCommand(_) => None,
        }
    }
}

/// Lease on a controller's codec command interface.
pub type CommandLease = Lease<dyn CodecCommand>;

/// Lease on a controller's location path interface.
pub type PathLease = Lease<dyn LocationPath>;

/// Exclusive hold on one capability of one controller.
///
/// Closed in the registry when dropped.
pub struct Lease<T: ?Sized + LeaseTarget> {
    registry: Arc<dyn EnumerationRegistry>,
    handle: ControllerHandle,
    requester: RequesterId,
    mode: LeaseMode,
    interface: Arc<T>,
}

impl<T: ?Sized + LeaseTarget> Lease<T> {
    /// Open `T` on `handle` exclusively for `requester`.
    ///
    /// # Errors
    /// `LeaseDenied` if the registry refuses, or if it hands back a
    /// capability of the wrong kind (which is closed again before returning).
    pub fn acquire(
        registry: &Arc<dyn EnumerationRegistry>,
        handle: ControllerHandle,
        requester: RequesterId,
        mode: LeaseMode,
    ) -> BindingResult<Self> {
        let denied = |source| BindingError::LeaseDenied {
            handle,
            kind: T::KIND,
            source,
        };

        let capability = registry
            .open_exclusive(handle, T::KIND, requester)
            .map_err(denied)?;

        let Some(interface) = T::extract(capability) else {
            registry.close(handle, T::KIND, requester);
            return Err(denied(RegistryError::NotSupported));
        };

        tracing::trace!(%handle, kind = %T::KIND, %requester, ?mode, "lease acquired");

        Ok(Self {
            registry: Arc::clone(registry),
            handle,
            requester,
            mode,
            interface,
        })
    }

    /// Controller this lease is on
    pub fn handle(&self) -> ControllerHandle {
        self.handle
    }

    /// Capability kind held
    pub fn kind(&self) -> CapabilityKind {
        T::KIND
    }

    /// Current usage mode
    pub fn mode(&self) -> LeaseMode {
        self.mode
    }

    /// Mark a trial lease as owned by an attachment
    pub fn promote(&mut self) {
        self.mode = LeaseMode::Operational;
    }

    /// Close the lease now instead of at end of scope
    pub fn release(self) {
        drop(self);
    }
}

impl<T: ?Sized + LeaseTarget> Deref for Lease<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.interface
    }
}

impl<T: ?Sized + LeaseTarget> Drop for Lease<T> {
    fn drop(&mut self) {
        self.registry.close(self.handle, T::KIND, self.requester);
        tracing::trace!(
            handle = %self.handle,
            kind = %T::KIND,
            requester = %self.requester,
            mode = ?self.mode,
            "lease released"
        );
    }
}

impl<T: ?Sized + LeaseTarget> fmt::Debug for Lease<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("handle", &self.handle)
            .field("kind", &T::KIND)
            .field("requester", &self.requester)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Close `kind` on `handle` for `requester`, whether or not it is held.
pub fn release(
    registry: &dyn EnumerationRegistry,
    handle: ControllerHandle,
    kind: CapabilityKind,
    requester: RequesterId,
) {
    registry.close(handle, kind, requester);
}
