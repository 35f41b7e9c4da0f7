//! # WR3223 Serial Communication
//!
//! This module owns the serial side of the protocol: opening the line with
//! the controller's settings, writing read requests and collecting responses.
//!
//! The line is half-duplex, so a session performs exactly one transaction at
//! a time. Every method that talks to the controller takes `&mut self`; share
//! a session between tasks through [`SharedSession`](super::shared::SharedSession).

use crate::config::{ChecksumMode, SessionConfig};
use crate::constants::{EOT, MAX_RESPONSE_LEN, NAK, STX};
use crate::error::Wr3223Error;
use crate::logging::log_frame;
use crate::registry;
use crate::wr3223::frame::{
    checksum_position, extract_value, humanize, parse_response, read_request, Address,
    ResponseFrame,
};
use bytes::BytesMut;
use log::{debug, info, warn};
use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout_at, Instant};
use tokio_serial::SerialPortBuilderExt;

/// Values read in one batch, keyed by command code. Failed codes are absent.
pub type QueryResult = HashMap<String, String>;

const READ_CHUNK: usize = 64;

/// Trait for serial port operations
#[async_trait::async_trait]
pub trait SerialPort: AsyncRead + AsyncWrite + Unpin + Send {
    async fn flush(&mut self) -> Result<(), std::io::Error>;

    /// Drops whatever is buffered on the receive side and returns how many
    /// bytes were dropped.
    fn discard_input(&mut self) -> Result<usize, std::io::Error> {
        Ok(0)
    }
}

#[async_trait::async_trait]
impl SerialPort for tokio_serial::SerialStream {
    async fn flush(&mut self) -> Result<(), std::io::Error> {
        AsyncWriteExt::flush(self).await
    }

    fn discard_input(&mut self) -> Result<usize, std::io::Error> {
        let pending = tokio_serial::SerialPort::bytes_to_read(self)?;
        tokio_serial::SerialPort::clear(self, tokio_serial::ClearBuffer::Input)?;
        Ok(pending as usize)
    }
}

#[async_trait::async_trait]
impl SerialPort for crate::wr3223::serial_mock::MockSerialPort {
    async fn flush(&mut self) -> Result<(), std::io::Error> {
        Ok(())
    }

    fn discard_input(&mut self) -> Result<usize, std::io::Error> {
        Ok(self.drain_rx())
    }
}

/// A connection to one WR3223 controller.
///
/// Starts disconnected. `connect` opens the configured OS port; `connect_with`
/// attaches any [`SerialPort`], which is how tests drive a mock.
pub struct Wr3223Session<P = tokio_serial::SerialStream> {
    config: SessionConfig,
    address: Address,
    port: Option<P>,
    rx: BytesMut,
}

impl Wr3223Session<tokio_serial::SerialStream> {
    /// Creates a session for `config` and opens its port.
    pub async fn open(config: SessionConfig) -> Result<Self, Wr3223Error> {
        let mut session = Self::new(config)?;
        session.connect().await?;
        Ok(session)
    }

    /// Opens the serial port with the configured line settings.
    pub async fn connect(&mut self) -> Result<(), Wr3223Error> {
        let port = tokio_serial::new(&self.config.port, self.config.baudrate)
            .data_bits(self.config.serial_data_bits())
            .parity(self.config.serial_parity())
            .stop_bits(self.config.serial_stop_bits())
            .flow_control(self.config.serial_flow_control())
            .timeout(self.config.timeout())
            .open_native_async()
            .map_err(|e| Wr3223Error::TransportError(format!("{}: {e}", self.config.port)))?;

        info!(
            "Opened {} at {} baud for controller {}",
            self.config.port, self.config.baudrate, self.address
        );
        self.connect_with(port);
        Ok(())
    }
}

impl<P: SerialPort> Wr3223Session<P> {
    /// Creates a disconnected session. Fails when the config is invalid.
    pub fn new(config: SessionConfig) -> Result<Self, Wr3223Error> {
        config.validate()?;
        let address = config.address()?;
        Ok(Wr3223Session {
            config,
            address,
            port: None,
            rx: BytesMut::with_capacity(READ_CHUNK),
        })
    }

    /// Attaches an already opened port, replacing any previous one.
    pub fn connect_with(&mut self, port: P) {
        self.rx.clear();
        self.port = Some(port);
    }

    /// Closes the port. Dropping the stream closes the OS handle.
    pub async fn disconnect(&mut self) -> Result<(), Wr3223Error> {
        if self.port.take().is_some() {
            debug!("Closed {}", self.config.port);
        }
        self.rx.clear();
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Reads one command and returns its value string.
    ///
    /// The checksum byte is read off the line. It is only verified in
    /// [`ChecksumMode::Strict`].
    pub async fn read_one(&mut self, code: &str) -> Result<String, Wr3223Error> {
        let raw = self.transact(code).await?;
        if self.config.checksum == ChecksumMode::Strict {
            self.check_frame(code, &raw)?;
        }
        // value comes from the ETX-terminated segment, checksum excluded
        Ok(extract_value(&raw[..raw.len() - 1]))
    }

    /// Reads one command and returns the whole parsed frame.
    pub async fn read_frame(&mut self, code: &str) -> Result<ResponseFrame, Wr3223Error> {
        let raw = self.transact(code).await?;
        self.check_frame(code, &raw)
    }

    /// Reads `codes` one after the other.
    ///
    /// A failing code is logged and left out of the result; the remaining
    /// codes are still read. Callers detect failures by absent keys.
    pub async fn read_many<I, S>(&mut self, codes: I) -> QueryResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = QueryResult::new();
        for code in codes {
            let code = code.as_ref();
            let outcome = self.read_one(code).await;
            record(&mut results, code, outcome);
        }
        results
    }

    /// Reads every registered command in sorted order.
    pub async fn read_all(&mut self) -> QueryResult {
        self.read_many(registry::all_codes().iter().copied()).await
    }

    fn check_frame(&self, code: &str, raw: &[u8]) -> Result<ResponseFrame, Wr3223Error> {
        let frame = parse_response(raw)?;
        if frame.echo != code {
            warn!("Controller echoed {:?} for request {code}", frame.echo);
        }
        if self.config.checksum == ChecksumMode::Strict {
            frame.verify()?;
        }
        Ok(frame)
    }

    /// One request/response exchange. Returns the response up to and
    /// including the checksum byte.
    async fn transact(&mut self, code: &str) -> Result<Vec<u8>, Wr3223Error> {
        let request = read_request(self.address, code)?;
        self.send_request(&request).await?;
        let response = self.recv_response().await;
        if response.is_err() {
            // whatever arrived belongs to the failed exchange
            self.rx.clear();
        }
        response
    }

    async fn send_request(&mut self, request: &[u8]) -> Result<(), Wr3223Error> {
        let port = self.port.as_mut().ok_or_else(not_connected)?;

        let stale = port.discard_input()?;
        if stale > 0 {
            warn!("Discarded {stale} stale bytes before request");
        }

        log_frame("->", request);
        port.write_all(request).await?;
        SerialPort::flush(port).await?;
        Ok(())
    }

    /// Collects the response. The whole exchange shares one deadline and the
    /// buffer is bounded by `MAX_RESPONSE_LEN`; each pass scans only the bytes
    /// appended since the previous one.
    async fn recv_response(&mut self) -> Result<Vec<u8>, Wr3223Error> {
        let read_timeout = self.config.timeout();
        let deadline = Instant::now() + read_timeout;
        let port = self.port.as_mut().ok_or_else(not_connected)?;
        let mut scanned: usize = 0;
        let mut in_payload = false;

        loop {
            // an ETX at the end of the previous pass may still need its checksum
            let window = scanned.saturating_sub(1);
            if let Some(pos) = checksum_position(&self.rx[window..]) {
                let frame = self.rx.split_to(window + pos + 1);
                if !self.rx.is_empty() {
                    warn!("{} bytes after checksum ignored", self.rx.len());
                    self.rx.clear();
                }
                log_frame("<-", &frame);
                return Ok(frame.to_vec());
            }

            if !in_payload {
                let fresh = &self.rx[scanned..];
                if let Some(byte) = rejection(fresh) {
                    return Err(Wr3223Error::TransportError(format!(
                        "controller answered {}",
                        humanize(&[byte])
                    )));
                }
                in_payload = fresh.contains(&STX);
            }

            if self.rx.len() >= MAX_RESPONSE_LEN {
                return Err(Wr3223Error::MalformedFrame(format!(
                    "no ETX within {} bytes",
                    self.rx.len()
                )));
            }
            if Instant::now() >= deadline {
                return Err(no_response(read_timeout));
            }
            scanned = self.rx.len();

            let mut chunk = [0u8; READ_CHUNK];
            let n = timeout_at(deadline, port.read(&mut chunk))
                .await
                .map_err(|_| no_response(read_timeout))??;
            if n == 0 {
                return Err(Wr3223Error::TransportError(
                    "serial line closed while waiting for response".into(),
                ));
            }
            self.rx.extend_from_slice(&chunk[..n]);
        }
    }
}

/// Adds a successful read to `results`. A failed code is logged and left out.
pub(crate) fn record(
    results: &mut QueryResult,
    code: &str,
    outcome: Result<String, Wr3223Error>,
) {
    match outcome {
        Ok(value) => {
            results.insert(code.to_string(), value);
        }
        Err(e) => warn!("No result for {code}: {e}"),
    }
}

fn no_response(read_timeout: std::time::Duration) -> Wr3223Error {
    Wr3223Error::TransportError(format!(
        "no response within {} ms",
        read_timeout.as_millis()
    ))
}

fn not_connected() -> Wr3223Error {
    Wr3223Error::TransportError("session is not connected".into())
}

/// A NAK or EOT ahead of any STX means the controller refused the request.
fn rejection(buf: &[u8]) -> Option<u8> {
    buf.iter()
        .take_while(|&&b| b != STX)
        .find(|&&b| b == NAK || b == EOT)
        .copied()
}
