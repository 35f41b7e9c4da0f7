//! # Session Configuration
//!
//! Serial line and protocol settings for a WR3223 session. Defaults match the
//! controller's fixed line settings (9600 baud, 7E1, RTS/CTS), so a config
//! file normally only names the port and, on shared buses, the address.
//!
//! ```json
//! { "port": "/dev/ttyUSB1", "address": 2, "checksum": "strict" }
//! ```

use crate::constants::{DEFAULT_ADDRESS, DEFAULT_BAUDRATE, DEFAULT_PORT, DEFAULT_TIMEOUT_MS};
use crate::error::Wr3223Error;
use crate::wr3223::frame::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

/// What to do with the byte following ETX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumMode {
    /// Read and discard it.
    #[default]
    Ignore,
    /// Verify it against the block check of the frame.
    Strict,
}

/// Configuration for one WR3223 session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub port: String,
    pub address: i64,
    pub baudrate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
    pub flow_control: FlowControl,
    pub timeout_ms: u64,
    pub checksum: ChecksumMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            port: DEFAULT_PORT.to_string(),
            address: i64::from(DEFAULT_ADDRESS),
            baudrate: DEFAULT_BAUDRATE,
            data_bits: 7,
            parity: Parity::Even,
            stop_bits: 1,
            flow_control: FlowControl::Hardware,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            checksum: ChecksumMode::Ignore,
        }
    }
}

impl SessionConfig {
    /// Default settings for `port`.
    pub fn for_port(port: &str) -> Self {
        SessionConfig {
            port: port.to_string(),
            ..Default::default()
        }
    }

    /// Loads a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Wr3223Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Wr3223Error::ConfigError(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, Wr3223Error> {
        let config: SessionConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks field ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), Wr3223Error> {
        Address::new(self.address)?;
        if !(5..=8).contains(&self.data_bits) {
            return Err(Wr3223Error::ConfigError(format!(
                "data_bits must be 5..=8, got {}",
                self.data_bits
            )));
        }
        if !(1..=2).contains(&self.stop_bits) {
            return Err(Wr3223Error::ConfigError(format!(
                "stop_bits must be 1 or 2, got {}",
                self.stop_bits
            )));
        }
        if self.timeout_ms == 0 {
            return Err(Wr3223Error::ConfigError("timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn address(&self) -> Result<Address, Wr3223Error> {
        Address::new(self.address)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn serial_data_bits(&self) -> tokio_serial::DataBits {
        match self.data_bits {
            5 => tokio_serial::DataBits::Five,
            6 => tokio_serial::DataBits::Six,
            7 => tokio_serial::DataBits::Seven,
            _ => tokio_serial::DataBits::Eight,
        }
    }

    pub fn serial_parity(&self) -> tokio_serial::Parity {
        match self.parity {
            Parity::None => tokio_serial::Parity::None,
            Parity::Odd => tokio_serial::Parity::Odd,
            Parity::Even => tokio_serial::Parity::Even,
        }
    }

    pub fn serial_stop_bits(&self) -> tokio_serial::StopBits {
        match self.stop_bits {
            2 => tokio_serial::StopBits::Two,
            _ => tokio_serial::StopBits::One,
        }
    }

    pub fn serial_flow_control(&self) -> tokio_serial::FlowControl {
        match self.flow_control {
            FlowControl::None => tokio_serial::FlowControl::None,
            FlowControl::Software => tokio_serial::FlowControl::Software,
            FlowControl::Hardware => tokio_serial::FlowControl::Hardware,
        }
    }
}
