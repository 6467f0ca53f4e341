//! HD Audio codec verb encoding.
//!
//! Only the 12-bit verb form is needed here: a 12-bit verb id followed by an
//! 8-bit payload. The codec address and node id are added by the transport.

/// Get Parameter verb
pub const GET_PARAMETER: u16 = 0xF00;

/// Vendor ID parameter (vendor in the high 16 bits, device in the low 16)
pub const PARAMETER_VENDOR_ID: u8 = 0x00;

/// Root node of every codec
pub const ROOT_NODE: u8 = 0;

/// Encode a 12-bit verb with an 8-bit payload.
pub const fn verb_12bit(verb: u16, payload: u8) -> u32 {
    (((verb & 0x0FFF) as u32) << 8) | payload as u32
}

/// Command word that reads the vendor/device id pair.
pub const VENDOR_ID_QUERY: u32 = verb_12bit(GET_PARAMETER, PARAMETER_VENDOR_ID);
