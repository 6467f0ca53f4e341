//! # HDA Codec Binding
//!
//! Driver-binding core for High Definition Audio codec controllers. The host
//! enumeration framework offers controllers one at a time; this crate decides
//! whether to claim each one, holds exclusive leases on the capabilities it
//! needs while bound, and gives them back on detach.
//!
//! ## Crate Structure
//!
//! - **`handle`**: opaque controller and requester identities.
//! - **`capability`**: the two leased capabilities, codec command and location path.
//! - **`registry`**: the `EnumerationRegistry` contract for exclusive opens.
//! - **`lease`**: RAII lease guards that close on drop.
//! - **`verb`** / **`identity`**: the vendor-id handshake.
//! - **`binding`**: the probe / attach / detach state machine.
//! - **`descriptor`**, **`naming`**, **`registration`**: publishing the driver.
//! - **`mock`**: in-memory collaborators for tests and the simulation binary.
//! - **`config`** / **`logging`**: Figment configuration and tracing setup.
//! - **`error`**: `BindingError`, the crate-wide error type.

pub mod binding;
pub mod capability;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod handle;
pub mod identity;
pub mod lease;
pub mod logging;
pub mod mock;
pub mod naming;
pub mod registration;
pub mod registry;
pub mod verb;

pub use binding::{BindingOptions, BindingState, DriverBinding, HdaCodecBinding};
pub use capability::{Capability, CapabilityKind, CodecCommand, LocationPath, TransportError};
pub use descriptor::{BindingDescriptor, DRIVER_VERSION};
pub use error::{BindingError, BindingResult};
pub use handle::{ControllerHandle, RequesterId};
pub use identity::DeviceIdentity;
pub use naming::{ComponentName, DRIVER_NAME};
pub use registration::{register, RegistrationSink};
pub use registry::{EnumerationRegistry, RegistryError};
