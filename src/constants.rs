//! WR3223 Protocol Constants
//!
//! Control characters and serial line defaults used by the Hermes WR3223
//! controller. The framing follows ANSI X3.28.

/// Start of text, opens a response payload
pub const STX: u8 = 0x02;

/// End of text, closes a response payload
pub const ETX: u8 = 0x03;

/// End of transmission, opens a request
pub const EOT: u8 = 0x04;

/// Enquiry, closes a read request
pub const ENQ: u8 = 0x05;

/// Acknowledge
pub const ACK: u8 = 0x06;

/// Negative acknowledge
pub const NAK: u8 = 0x15;

/// Control bytes with their diagnostic mnemonics
pub const CONTROL_MNEMONICS: [(u8, &str); 6] = [
    (STX, "<STX>"),
    (ETX, "<ETX>"),
    (EOT, "<EOT>"),
    (ENQ, "<ENQ>"),
    (ACK, "<ACK>"),
    (NAK, "<NAK>"),
];

/// Length of a command code on the wire
pub const COMMAND_CODE_LEN: usize = 2;

/// Length of the echo field following STX in a response
pub const ECHO_FIELD_LEN: usize = 2;

/// Highest address a controller can have on the bus
pub const MAX_ADDRESS: i64 = 99;

/// Longest response accepted before ETX and checksum have arrived
pub const MAX_RESPONSE_LEN: usize = 128;

// ----------------------------------------------------------------------------
// Serial line defaults (9600 7E1, RTS/CTS)
// ----------------------------------------------------------------------------

pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
pub const DEFAULT_ADDRESS: u8 = 1;
pub const DEFAULT_BAUDRATE: u32 = 9600;
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
