//! In-memory collaborators for testing and simulation.
//!
//! Stands in for the pieces owned by the enumeration framework so the
//! binding can run without firmware underneath it:
//!
//! - [`InMemoryRegistry`] - lease table with atomic exclusive opens
//! - [`SimulatedCodec`] - command interface with injectable failures
//! - [`SimulatedPath`] - fixed location path text
//! - [`InMemoryDriverRegistry`] - registration sink
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = Arc::new(InMemoryRegistry::new());
//! registry.add_codec(handle, Arc::new(SimulatedCodec::new(0, 0x10DE_0040)));
//! registry.add_path(handle, Arc::new(SimulatedPath::new("PciRoot(0x0)/Pci(0x1B,0x0)")));
//!
//! // Another driver already owns the command interface
//! registry.claim(other, CapabilityKind::CodecCommand, RequesterId::new(99));
//! ```

use crate::capability::{
    Capability, CapabilityKind, CodecCommand, LocationPath, TransportError,
};
use crate::descriptor::BindingDescriptor;
use crate::handle::{ControllerHandle, RequesterId};
use crate::naming::ComponentName;
use crate::registration::{InstallError, RegistrationSink};
use crate::registry::{EnumerationRegistry, RegistryError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

// =============================================================================
// InMemoryRegistry
// =============================================================================

#[derive(Default)]
struct RegistryState {
    codecs: HashMap<ControllerHandle, Arc<dyn CodecCommand>>,
    paths: HashMap<ControllerHandle, Arc<dyn LocationPath>>,
    holders: HashMap<(ControllerHandle, CapabilityKind), RequesterId>,
}

/// Lease table keyed by (controller, capability kind).
///
/// `open_exclusive` checks and records the holder under one lock, so at
/// most one requester holds a given capability at a time. By default a
/// second open by the current holder is denied as well; see
/// [`InMemoryRegistry::allowing_reopen`].
#[derive(Default)]
pub struct InMemoryRegistry {
    state: Mutex<RegistryState>,
    allow_reopen: bool,
}

impl InMemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Let the current holder open a capability it already holds.
    ///
    /// Opens are not counted: the holder's next `close` releases the
    /// capability no matter how many times it was opened.
    pub fn allowing_reopen(mut self) -> Self {
        self.allow_reopen = true;
        self
    }

    /// Expose a command interface on `handle`
    pub fn add_codec(&self, handle: ControllerHandle, codec: Arc<dyn CodecCommand>) {
        self.state.lock().codecs.insert(handle, codec);
    }

    /// Expose a location path on `handle`
    pub fn add_path(&self, handle: ControllerHandle, path: Arc<dyn LocationPath>) {
        self.state.lock().paths.insert(handle, path);
    }

    /// Mark `kind` on `handle` as held by `holder` without opening it
    pub fn claim(&self, handle: ControllerHandle, kind: CapabilityKind, holder: RequesterId) {
        self.state.lock().holders.insert((handle, kind), holder);
    }

    /// Current holder of `kind` on `handle`
    pub fn holder(&self, handle: ControllerHandle, kind: CapabilityKind) -> Option<RequesterId> {
        self.state.lock().holders.get(&(handle, kind)).copied()
    }

    /// Number of capabilities of `handle` currently held by anyone
    pub fn held_count(&self, handle: ControllerHandle) -> usize {
        self.state
            .lock()
            .holders
            .keys()
            .filter(|(h, _)| *h == handle)
            .count()
    }

    /// Number of capabilities held by `requester` across all controllers
    pub fn held_by(&self, requester: RequesterId) -> usize {
        self.state
            .lock()
            .holders
            .values()
            .filter(|holder| **holder == requester)
            .count()
    }

    /// Controllers that expose at least one capability, in handle order
    pub fn handles(&self) -> Vec<ControllerHandle> {
        let state = self.state.lock();
        let mut handles: Vec<_> = state
            .codecs
            .keys()
            .chain(state.paths.keys())
            .copied()
            .collect();
        handles.sort();
        handles.dedup();
        handles
    }
}

impl EnumerationRegistry for InMemoryRegistry {
    fn open_exclusive(
        &self,
        handle: ControllerHandle,
        kind: CapabilityKind,
        requester: RequesterId,
    ) -> Result<Capability, RegistryError> {
        let mut state = self.state.lock();

        match state.holders.get(&(handle, kind)) {
            Some(holder) if *holder == requester && self.allow_reopen => {}
            Some(_) => return Err(RegistryError::AlreadyOwned),
            None => {}
        }

        let capability = match kind {
            CapabilityKind::CodecCommand => state
                .codecs
                .get(&handle)
                .cloned()
                .map(Capability::CodecCommand),
            CapabilityKind::LocationPath => state
                .paths
                .get(&handle)
                .cloned()
                .map(Capability::LocationPath),
        }
        .ok_or(RegistryError::NotSupported)?;

        state.holders.insert((handle, kind), requester);
        Ok(capability)
    }

    fn close(&self, handle: ControllerHandle, kind: CapabilityKind, requester: RequesterId) {
        let mut state = self.state.lock();
        if state.holders.get(&(handle, kind)) == Some(&requester) {
            state.holders.remove(&(handle, kind));
        }
    }
}

// =============================================================================
// SimulatedCodec
// =============================================================================

/// Codec command interface with a fixed vendor-id response.
#[derive(Debug)]
pub struct SimulatedCodec {
    address: u8,
    response: u32,
    address_error: Option<TransportError>,
    command_error: Option<TransportError>,
    sent: Mutex<Vec<(u8, u32)>>,
}

impl SimulatedCodec {
    /// Codec at `address` answering every command with `response`
    pub fn new(address: u8, response: u32) -> Self {
        Self {
            address,
            response,
            address_error: None,
            command_error: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Make every address query fail with `error`
    pub fn failing_address(mut self, error: TransportError) -> Self {
        self.address_error = Some(error);
        self
    }

    /// Make every command fail with `error`
    pub fn failing_command(mut self, error: TransportError) -> Self {
        self.command_error = Some(error);
        self
    }

    /// Commands received so far as (node, verb) pairs
    pub fn sent_commands(&self) -> Vec<(u8, u32)> {
        self.sent.lock().clone()
    }
}

impl CodecCommand for SimulatedCodec {
    fn address(&self) -> Result<u8, TransportError> {
        match &self.address_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.address),
        }
    }

    fn send_command(&self, node: u8, verb: u32) -> Result<u32, TransportError> {
        self.sent.lock().push((node, verb));
        match &self.command_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.response),
        }
    }
}

// =============================================================================
// SimulatedPath
// =============================================================================

/// Location path that renders to fixed text.
#[derive(Debug, Clone)]
pub struct SimulatedPath {
    text: String,
}

impl SimulatedPath {
    /// Path rendering as `text`
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl LocationPath for SimulatedPath {
    fn to_text(&self) -> String {
        self.text.clone()
    }
}

// =============================================================================
// InMemoryDriverRegistry
// =============================================================================

/// Registration sink keeping installed descriptors by driver name.
#[derive(Debug, Default)]
pub struct InMemoryDriverRegistry {
    installed: Mutex<HashMap<String, (BindingDescriptor, ComponentName)>>,
    reject_with: Option<String>,
}

impl InMemoryDriverRegistry {
    /// Create an empty registry that accepts installs
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that rejects every install with `reason`
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            installed: Mutex::new(HashMap::new()),
            reject_with: Some(reason.into()),
        }
    }

    /// Installed descriptor for `driver_name`
    pub fn get(&self, driver_name: &str) -> Option<BindingDescriptor> {
        self.installed
            .lock()
            .get(driver_name)
            .map(|(descriptor, _)| descriptor.clone())
    }

    /// Naming collaborator installed with `driver_name`
    pub fn naming(&self, driver_name: &str) -> Option<ComponentName> {
        self.installed
            .lock()
            .get(driver_name)
            .map(|(_, naming)| naming.clone())
    }

    /// Number of installed drivers
    pub fn len(&self) -> usize {
        self.installed.lock().len()
    }

    /// True when nothing is installed
    pub fn is_empty(&self) -> bool {
        self.installed.lock().is_empty()
    }
}

impl RegistrationSink for InMemoryDriverRegistry {
    fn install(
        &self,
        descriptor: BindingDescriptor,
        naming: ComponentName,
    ) -> Result<(), InstallError> {
        if let Some(reason) = &self.reject_with {
            return Err(InstallError::Rejected(reason.clone()));
        }

        let mut installed = self.installed.lock();
        let name = descriptor.driver_name().to_string();
        if installed.contains_key(&name) {
            return Err(InstallError::Duplicate(name));
        }
        installed.insert(name, (descriptor, naming));
        Ok(())
    }
}
