//! # wr3223-rs - A Rust Crate for the Hermes WR3223 Serial Protocol
//!
//! The wr3223-rs crate talks to Hermes WR3223 heat-recovery ventilation
//! controllers (as built into Schwörer WGT units) over their RS-232 service
//! port. The protocol is half-duplex ASCII in the ANSI X3.28 style: the client
//! sends `EOT address code ENQ`, the controller answers
//! `STX echo value ETX BCC`.
//!
//! ## Features
//!
//! - Registry of every readable controller parameter with units and value labels
//! - Request building and response parsing (lenient and strict)
//! - Async serial sessions on top of `tokio-serial`, single and batch reads
//! - A shared session handle that serializes transactions between tasks
//! - Human readable formatting of results
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wr3223_rs::{connect, format_result, SessionConfig};
//!
//! # async fn run() -> Result<(), wr3223_rs::Wr3223Error> {
//! let mut session = connect(SessionConfig::for_port("/dev/ttyUSB0")).await?;
//! let results = session.read_many(["T1", "T3", "MD"]).await;
//! for (code, value) in &results {
//!     println!("{}", format_result(code, value));
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod presenter;
pub mod registry;
pub mod wr3223;

pub use crate::config::{ChecksumMode, SessionConfig};
pub use crate::error::Wr3223Error;
pub use crate::logging::{init_logger, log_info};
pub use crate::presenter::{format_result, missing_codes};
pub use crate::registry::{all_codes, lookup, map_label, CommandSpec};

pub use wr3223::{
    build_read_request, encode_address, extract_value, humanize, Address, QueryResult,
    SharedSession, Wr3223Session,
};

/// Opens a session on the port named in `config`.
///
/// # Returns
/// * `Ok(Wr3223Session)` - Connected session
/// * `Err(Wr3223Error)` - Invalid config or the port could not be opened
pub async fn connect(config: SessionConfig) -> Result<Wr3223Session, Wr3223Error> {
    Wr3223Session::<tokio_serial::SerialStream>::open(config).await
}

/// Closes a session.
pub async fn disconnect(session: &mut Wr3223Session) -> Result<(), Wr3223Error> {
    session.disconnect().await
}

/// Reads a single command.
///
/// # Arguments
/// * `session` - Connected session
/// * `code` - Two character command code, e.g. `"T1"`
pub async fn read(session: &mut Wr3223Session, code: &str) -> Result<String, Wr3223Error> {
    session.read_one(code).await
}

/// Reads several commands in order. Codes that failed are absent from the result.
pub async fn read_many(session: &mut Wr3223Session, codes: &[&str]) -> QueryResult {
    session.read_many(codes.iter().copied()).await
}
