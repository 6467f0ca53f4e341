//! Binding descriptor published to the enumeration framework.

use crate::binding::DriverBinding;
use crate::handle::RequesterId;
use std::fmt;
use std::sync::Arc;

/// Version reported in the descriptor.
///
/// The framework uses it when ordering drivers that claim the same
/// controller; the ordering policy belongs to the framework.
pub const DRIVER_VERSION: u32 = 0x10;

/// Immutable registration record for a driver binding.
///
/// Carries the entry points, the version, and two slots the framework fills
/// in when it links the binding to its image and binding contexts. Both
/// slots are empty at construction.
#[derive(Clone)]
pub struct BindingDescriptor {
    driver_name: String,
    binding: Arc<dyn DriverBinding>,
    version: u32,
    image_handle: Option<RequesterId>,
    binding_handle: Option<RequesterId>,
}

impl BindingDescriptor {
    /// Describe `binding` under `driver_name` at `version`
    pub fn new(driver_name: impl Into<String>, binding: Arc<dyn DriverBinding>, version: u32) -> Self {
        Self {
            driver_name: driver_name.into(),
            binding,
            version,
            image_handle: None,
            binding_handle: None,
        }
    }

    /// Driver name the descriptor is registered under
    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    /// Probe / attach / detach entry points
    pub fn binding(&self) -> &Arc<dyn DriverBinding> {
        &self.binding
    }

    /// Descriptor version
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Reserved image context slot
    pub fn image_handle(&self) -> Option<RequesterId> {
        self.image_handle
    }

    /// Reserved binding context slot
    pub fn binding_handle(&self) -> Option<RequesterId> {
        self.binding_handle
    }
}

impl fmt::Debug for BindingDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingDescriptor")
            .field("driver_name", &self.driver_name)
            .field("version", &format_args!("{:#x}", self.version))
            .field("image_handle", &self.image_handle)
            .field("binding_handle", &self.binding_handle)
            .finish_non_exhaustive()
    }
}
