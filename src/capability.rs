//! Narrow capability interfaces leased from the enumeration registry.
//!
//! A controller exposes its operations as small, independently leased
//! interfaces rather than one device object:
//!
//! - [`CodecCommand`]: bus address and the command/response channel
//! - [`LocationPath`]: the controller's position in the hardware topology
//!
//! The registry hands them out wrapped in a [`Capability`], tagged by
//! [`CapabilityKind`].

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Failure reported by the underlying codec transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Codec did not answer the command
    #[error("codec did not respond")]
    NoResponse,

    /// Transport gave up waiting for the response
    #[error("codec command timed out")]
    Timeout,

    /// Any other link-level failure, described by the transport
    #[error("bus error: {0}")]
    Bus(String),
}

// =============================================================================
// Capability Traits
// =============================================================================

/// Command interface of an HDA codec.
///
/// Every call is synchronous: one command word out, one response word back.
pub trait CodecCommand: Send + Sync {
    /// Bus address of the codec on its link
    fn address(&self) -> Result<u8, TransportError>;

    /// Send `verb` to `node` and return the codec's response word
    fn send_command(&self, node: u8, verb: u32) -> Result<u32, TransportError>;
}

/// Location path of a controller, used only for diagnostics.
pub trait LocationPath: Send + Sync {
    /// Render the path as display text
    fn to_text(&self) -> String;
}

// =============================================================================
// Capability Kind / Capability
// =============================================================================

/// Which capability of a controller is being leased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    /// [`CodecCommand`]
    CodecCommand,
    /// [`LocationPath`]
    LocationPath,
}

impl CapabilityKind {
    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::CodecCommand => "codec-command",
            Self::LocationPath => "location-path",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A capability interface as handed out by the registry.
#[derive(Clone)]
pub enum Capability {
    /// Codec command interface
    CodecCommand(Arc<dyn CodecCommand>),
    /// Location path interface
    LocationPath(Arc<dyn LocationPath>),
}

impl Capability {
    /// Kind tag of this capability
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Self::CodecCommand(_) => CapabilityKind::CodecCommand,
            Self::LocationPath(_) => CapabilityKind::LocationPath,
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Capability").field(&self.kind()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPath;

    impl LocationPath for FixedPath {
        fn to_text(&self) -> String {
            "PciRoot(0x0)".to_string()
        }
    }

    #[test]
    fn test_capability_kind_tag() {
        let cap = Capability::LocationPath(Arc::new(FixedPath));
        assert_eq!(cap.kind(), CapabilityKind::LocationPath);
        assert_eq!(format!("{:?}", cap), "Capability(LocationPath)");
    }

    #[test]
    fn test_transport_error_display() {
        assert_eq!(TransportError::NoResponse.to_string(), "codec did not respond");
        assert_eq!(
            TransportError::Bus("link reset".into()).to_string(),
            "bus error: link reset"
        );
    }
}
