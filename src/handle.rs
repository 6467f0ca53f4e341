//! Opaque identities handed out by the enumeration framework.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token identifying one bus-enumerated controller node.
///
/// Created by the enumeration framework before any probe; this crate never
/// owns the node behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControllerHandle(u64);

impl ControllerHandle {
    /// Wrap a raw framework token
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw framework token
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ControllerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctrl#{:x}", self.0)
    }
}

/// Identity a driver presents to the registry when it leases a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequesterId(u64);

impl RequesterId {
    /// Wrap a raw requester token
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw requester token
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drv#{:x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_display_is_hex() {
        assert_eq!(ControllerHandle::new(0x1b).to_string(), "ctrl#1b");
        assert_eq!(RequesterId::new(255).to_string(), "drv#ff");
    }
}
