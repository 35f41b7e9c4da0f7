//! # WR3223 Error Handling
//!
//! This module defines the Wr3223Error enum, which represents the different error
//! types that can occur in the wr3223-rs crate.

use thiserror::Error;

/// Represents the different error types that can occur in the WR3223 crate.
#[derive(Debug, Error)]
pub enum Wr3223Error {
    /// The command code is not exactly two characters or is not registered.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// The controller address is outside of 0..=99.
    #[error("Invalid address: {0} (must be within 0..=99)")]
    InvalidAddress(i64),

    /// Indicates an error related to the serial line: I/O failure, timeout,
    /// or a session that is not connected.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Indicates a response that does not follow the STX/ETX framing.
    #[error("Malformed response frame: {0}")]
    MalformedFrame(String),

    /// Indicates a block check character that does not match the frame.
    #[error("Checksum mismatch: expected 0x{expected:02X}, calculated 0x{calculated:02X}")]
    ChecksumMismatch { expected: u8, calculated: u8 },

    /// Indicates an unreadable or invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Wr3223Error {
    /// True for failures of the serial line itself, as opposed to bad input.
    pub fn is_transport(&self) -> bool {
        matches!(self, Wr3223Error::TransportError(_))
    }
}

impl From<std::io::Error> for Wr3223Error {
    fn from(err: std::io::Error) -> Self {
        Wr3223Error::TransportError(err.to_string())
    }
}

impl From<tokio_serial::Error> for Wr3223Error {
    fn from(err: tokio_serial::Error) -> Self {
        Wr3223Error::TransportError(err.to_string())
    }
}

impl From<serde_json::Error> for Wr3223Error {
    fn from(err: serde_json::Error) -> Self {
        Wr3223Error::ConfigError(err.to_string())
    }
}
