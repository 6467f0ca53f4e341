//! Identification handshake.
//!
//! One synchronous command/response exchange that tells the driver which
//! codec sits behind a controller handle. No retries and no timeout of its
//! own; a transport failure is passed through as `CommandFailed`.

use crate::capability::CodecCommand;
use crate::error::BindingResult;
use crate::verb::{ROOT_NODE, VENDOR_ID_QUERY};
use std::fmt;

/// Vendor/device id pair and bus address of a codec.
///
/// Computed fresh on every probe and attach; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// PCI-SIG vendor id (high half of the response)
    pub vendor_id: u16,
    /// Vendor-assigned device id (low half of the response)
    pub device_id: u16,
    /// Codec address on the link
    pub address: u8,
}

impl DeviceIdentity {
    /// Split a vendor-id response word
    pub const fn from_response(response: u32, address: u8) -> Self {
        Self {
            vendor_id: (response >> 16) as u16,
            device_id: (response & 0xFFFF) as u16,
            address,
        }
    }

    /// Recombine into the raw response word
    pub const fn response_word(&self) -> u32 {
        ((self.vendor_id as u32) << 16) | self.device_id as u32
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04X}:{:04X} @ 0x{:X}",
            self.vendor_id, self.device_id, self.address
        )
    }
}

/// Read the codec's address and vendor/device ids.
///
/// # Errors
/// `CommandFailed` if either the address query or the vendor-id command
/// fails. The address is read first; its failure aborts the handshake.
pub fn query_identity(codec: &dyn CodecCommand) -> BindingResult<DeviceIdentity> {
    let address = codec.address()?;
    let response = codec.send_command(ROOT_NODE, VENDOR_ID_QUERY)?;
    Ok(DeviceIdentity::from_response(response, address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::TransportError;
    use crate::error::BindingError;
    use crate::mock::SimulatedCodec;

    #[test]
    fn test_response_split_high_vendor_low_device() {
        let identity = DeviceIdentity::from_response(0xABCD_1234, 2);
        assert_eq!(identity.vendor_id, 0xABCD);
        assert_eq!(identity.device_id, 0x1234);
        assert_eq!(identity.address, 2);
        assert_eq!(identity.response_word(), 0xABCD_1234);
    }

    #[test]
    fn test_display_matches_diagnostic_format() {
        let identity = DeviceIdentity::from_response(0x10DE_0040, 0);
        assert_eq!(identity.to_string(), "10DE:0040 @ 0x0");
    }

    #[test]
    fn test_query_sends_vendor_id_verb_to_root_node() {
        let codec = SimulatedCodec::new(3, 0x8086_2812);
        let identity = query_identity(&codec).unwrap();

        assert_eq!(identity, DeviceIdentity::from_response(0x8086_2812, 3));
        assert_eq!(codec.sent_commands(), vec![(ROOT_NODE, VENDOR_ID_QUERY)]);
    }

    #[test]
    fn test_command_failure_propagates_verbatim() {
        let codec = SimulatedCodec::new(0, 0).failing_command(TransportError::Timeout);
        let err = query_identity(&codec).unwrap_err();
        assert!(matches!(err, BindingError::CommandFailed(TransportError::Timeout)));
    }

    #[test]
    fn test_address_failure_aborts_before_command() {
        let codec = SimulatedCodec::new(0, 0x10EC_0892).failing_address(TransportError::NoResponse);
        let err = query_identity(&codec).unwrap_err();

        assert!(matches!(err, BindingError::CommandFailed(TransportError::NoResponse)));
        assert!(codec.sent_commands().is_empty());
    }
}
