//! Probe / attach / detach state machine for HDA codec controllers.
//!
//! The enumeration framework drives a controller through these states:
//!
//! ```text
//!            probe ok / reject
//!  Unbound ──────────────► Probing ──────► Unbound
//!     │                                      ▲
//!     │ attach          fail                 │
//!     ▼  ─────────────────────────────────── │
//! Attaching                                  │ detach
//!     │ ok                                   │
//!     ▼                                      │
//!   Bound ─────────────────────────────► Detaching
//! ```
//!
//! A controller this binding is already working on (any state other than
//! `Unbound`) is declined before the registry is touched, so a second probe
//! or attach can never re-open and then close a lease the binding holds.
//!
//! # Lease discipline
//!
//! - `probe` takes the command interface as a trial lease and always gives
//!   it back before returning.
//! - `attach` either ends `Bound` holding the command and location path
//!   leases, or fails holding none of the leases it took.
//! - `detach` releases both attachment leases and returns the controller
//!   to `Unbound`.
//!
//! Exclusivity between drivers is delegated to the registry. The slot table
//! kept here serializes this binding's own entry points per controller.

use crate::error::{BindingError, BindingResult};
use crate::handle::{ControllerHandle, RequesterId};
use crate::identity::{query_identity, DeviceIdentity};
use crate::lease::{CommandLease, LeaseMode, PathLease};
use crate::registry::EnumerationRegistry;
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Settling delay applied after a successful attach (10 s).
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(10);

// =============================================================================
// Entry Points
// =============================================================================

/// The three entry points the enumeration framework invokes on a driver.
pub trait DriverBinding: Send + Sync {
    /// Check whether this driver can manage `handle`.
    ///
    /// Returns the codec identity on success. Never leaves a lease held.
    fn probe(&self, handle: ControllerHandle) -> BindingResult<DeviceIdentity>;

    /// Bind to `handle` and take the resources needed to manage it.
    fn attach(&self, handle: ControllerHandle) -> BindingResult<()>;

    /// Undo a successful `attach`.
    fn detach(&self, handle: ControllerHandle, children: &[ControllerHandle]) -> BindingResult<()>;
}

/// Binding state of one controller as seen by this driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// Not attached (initial state)
    Unbound,
    /// A probe is in flight
    Probing,
    /// An attach is taking its leases
    Attaching,
    /// Attached; both leases held
    Bound,
    /// A detach is releasing the attachment
    Detaching,
}

/// Tunables for [`HdaCodecBinding`].
#[derive(Debug, Clone)]
pub struct BindingOptions {
    /// Blocking delay after attach so the codec can stabilize
    pub settle_delay: Duration,
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl BindingOptions {
    /// Options with a custom settling delay
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

// =============================================================================
// Attachment Table
// =============================================================================

/// Resources owned by one successful attach.
#[derive(Debug)]
struct Attachment {
    identity: Option<DeviceIdentity>,
    path_text: String,
    command: CommandLease,
    path: PathLease,
}

impl Attachment {
    /// Close the location path first, then the command interface
    fn release(self) {
        let Attachment { command, path, .. } = self;
        path.release();
        command.release();
    }
}

#[derive(Debug)]
enum Slot {
    Probing,
    Attaching,
    Bound(Attachment),
    Detaching,
}

impl Slot {
    fn state(&self) -> BindingState {
        match self {
            Self::Probing => BindingState::Probing,
            Self::Attaching => BindingState::Attaching,
            Self::Bound(_) => BindingState::Bound,
            Self::Detaching => BindingState::Detaching,
        }
    }
}

// =============================================================================
// HdaCodecBinding
// =============================================================================

/// Driver binding for HDA codec controllers.
pub struct HdaCodecBinding {
    registry: Arc<dyn EnumerationRegistry>,
    requester: RequesterId,
    options: BindingOptions,
    slots: Mutex<HashMap<ControllerHandle, Slot>>,
}

impl HdaCodecBinding {
    /// Create a binding that leases from `registry` as `requester`
    pub fn new(
        registry: Arc<dyn EnumerationRegistry>,
        requester: RequesterId,
        options: BindingOptions,
    ) -> Self {
        Self {
            registry,
            requester,
            options,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Identity this binding presents to the registry
    pub fn requester(&self) -> RequesterId {
        self.requester
    }

    /// Current settling delay
    pub fn settle_delay(&self) -> Duration {
        self.options.settle_delay
    }

    /// Binding state of `handle`
    pub fn state(&self, handle: ControllerHandle) -> BindingState {
        self.slots
            .lock()
            .get(&handle)
            .map_or(BindingState::Unbound, Slot::state)
    }

    /// Identity read during attach, if the controller is bound and the
    /// handshake succeeded
    pub fn identity(&self, handle: ControllerHandle) -> Option<DeviceIdentity> {
        match self.slots.lock().get(&handle) {
            Some(Slot::Bound(attachment)) => attachment.identity,
            _ => None,
        }
    }

    /// Location path text of a bound controller
    pub fn location_path(&self, handle: ControllerHandle) -> Option<String> {
        match self.slots.lock().get(&handle) {
            Some(Slot::Bound(attachment)) => Some(attachment.path_text.clone()),
            _ => None,
        }
    }

    /// Controllers currently bound, in handle order
    pub fn bound_handles(&self) -> Vec<ControllerHandle> {
        let mut handles: Vec<_> = self
            .slots
            .lock()
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Bound(_)))
            .map(|(handle, _)| *handle)
            .collect();
        handles.sort();
        handles
    }

    /// Claim the slot for `handle`, declining it if this binding already
    /// has one in any state
    fn reserve(&self, handle: ControllerHandle, slot: Slot) -> BindingResult<()> {
        match self.slots.lock().entry(handle) {
            Entry::Occupied(occupied) => {
                let state = occupied.get().state();
                tracing::debug!(%handle, ?state, "controller already in use by this driver");
                Err(BindingError::unsupported(
                    handle,
                    BindingError::InUse { handle, state },
                ))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
                Ok(())
            }
        }
    }

    /// Replace the slot for `handle` with `next` (or clear it), but only if
    /// it is still in state `from`
    fn transition(&self, handle: ControllerHandle, from: BindingState, next: Option<Slot>) {
        let mut slots = self.slots.lock();
        if slots.get(&handle).map(Slot::state) != Some(from) {
            return;
        }
        match next {
            Some(slot) => {
                slots.insert(handle, slot);
            }
            None => {
                slots.remove(&handle);
            }
        }
    }

    fn run_probe(&self, handle: ControllerHandle) -> BindingResult<DeviceIdentity> {
        let command = CommandLease::acquire(&self.registry, handle, self.requester, LeaseMode::Trial)
            .map_err(|err| {
                tracing::debug!(%handle, error = %err, "command interface unavailable");
                BindingError::unsupported(handle, err)
            })?;

        let identity = query_identity(&*command).map_err(|err| {
            tracing::debug!(%handle, error = %err, "identification failed");
            BindingError::unsupported(handle, err)
        })?;

        tracing::info!(%handle, %identity, "codec supported");
        command.release();
        Ok(identity)
    }

    fn run_attach(&self, handle: ControllerHandle) -> BindingResult<Attachment> {
        let mut command =
            CommandLease::acquire(&self.registry, handle, self.requester, LeaseMode::Trial)
                .map_err(|err| {
                    tracing::debug!(%handle, error = %err, "command interface unavailable");
                    BindingError::unsupported(handle, err)
                })?;

        // Identification is diagnostic here; a failure does not stop the attach.
        let identity = match query_identity(&*command) {
            Ok(identity) => {
                tracing::info!(%handle, %identity, "attaching to codec");
                Some(identity)
            }
            Err(err) => {
                tracing::warn!(%handle, error = %err, "identification failed, attaching anyway");
                None
            }
        };

        let path = match PathLease::acquire(
            &self.registry,
            handle,
            self.requester,
            LeaseMode::Operational,
        ) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(%handle, error = %err, "location path unavailable, rolling back attach");
                return Err(BindingError::unsupported(handle, err));
            }
        };

        let path_text = path.to_text();
        tracing::debug!(%handle, path = %path_text, "location path");

        command.promote();
        Ok(Attachment {
            identity,
            path_text,
            command,
            path,
        })
    }
}

impl DriverBinding for HdaCodecBinding {
    fn probe(&self, handle: ControllerHandle) -> BindingResult<DeviceIdentity> {
        tracing::debug!(%handle, "probe");
        self.reserve(handle, Slot::Probing)?;
        let result = self.run_probe(handle);
        self.transition(handle, BindingState::Probing, None);
        result
    }

    fn attach(&self, handle: ControllerHandle) -> BindingResult<()> {
        tracing::debug!(%handle, "attach");
        self.reserve(handle, Slot::Attaching)?;

        let attachment = match self.run_attach(handle) {
            Ok(attachment) => attachment,
            Err(err) => {
                self.transition(handle, BindingState::Attaching, None);
                return Err(err);
            }
        };
        self.transition(handle, BindingState::Attaching, Some(Slot::Bound(attachment)));

        if !self.options.settle_delay.is_zero() {
            tracing::debug!(%handle, delay = ?self.options.settle_delay, "settling");
            std::thread::sleep(self.options.settle_delay);
        }

        tracing::info!(%handle, "attached");
        Ok(())
    }

    fn detach(&self, handle: ControllerHandle, children: &[ControllerHandle]) -> BindingResult<()> {
        tracing::debug!(%handle, children = children.len(), "detach");
        if !children.is_empty() {
            tracing::warn!(%handle, ?children, "ignoring child handles; this driver creates none");
        }

        let attachment = {
            let mut slots = self.slots.lock();
            match slots.remove(&handle) {
                Some(Slot::Bound(attachment)) => {
                    slots.insert(handle, Slot::Detaching);
                    attachment
                }
                Some(other) => {
                    slots.insert(handle, other);
                    return Err(BindingError::NotBound(handle));
                }
                None => return Err(BindingError::NotBound(handle)),
            }
        };

        attachment.release();
        self.transition(handle, BindingState::Detaching, None);

        tracing::info!(%handle, "detached");
        Ok(())
    }
}
