//! Mock serial port implementation for testing
//!
//! This module provides a mock serial port that can be used to test
//! WR3223 sessions without requiring an actual controller.

use crate::constants::{ENQ, ETX, STX};
use crate::wr3223::frame::block_check;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Mock serial port that simulates bidirectional communication
#[derive(Clone, Default)]
pub struct MockSerialPort {
    /// Data written to the port (outgoing)
    pub tx_buffer: Arc<Mutex<Vec<u8>>>,
    /// Data to be read from the port (incoming)
    pub rx_buffer: Arc<Mutex<VecDeque<u8>>>,
    /// Simulated error for the next read
    pub next_read_error: Arc<Mutex<Option<io::Error>>>,
    /// Simulated error for the next write
    pub next_write_error: Arc<Mutex<Option<io::Error>>>,
    /// Upper bound on bytes handed out per read call, 0 for unlimited
    pub max_chunk: Arc<Mutex<usize>>,
    /// Replies released into `rx_buffer`, one per request written (ENQ seen)
    pub replies: Arc<Mutex<VecDeque<Vec<u8>>>>,
    /// Whether an empty rx buffer stalls (pending) instead of reading as end of stream
    pub stall_when_empty: Arc<Mutex<bool>>,
    /// Byte repeated forever once the rx buffer is empty, like a chattering line
    pub noise: Arc<Mutex<Option<u8>>>,
}

impl MockSerialPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue data to be read from the port
    pub fn queue_rx_data(&self, data: &[u8]) {
        let mut rx = self.rx_buffer.lock().unwrap();
        rx.extend(data);
    }

    /// Builds a well-formed response `STX echo value ETX BCC`
    pub fn response_frame(echo: &str, value: &str) -> Vec<u8> {
        let mut frame = vec![STX];
        frame.extend_from_slice(echo.as_bytes());
        frame.extend_from_slice(value.as_bytes());
        frame.push(ETX);
        let bcc = block_check(&frame[1..]);
        frame.push(bcc);
        frame
    }

    /// Queue a well-formed response to be read right away
    pub fn queue_response(&self, echo: &str, value: &str) {
        self.queue_rx_data(&Self::response_frame(echo, value));
    }

    /// Queue raw bytes the controller sends back after the next request
    pub fn queue_reply(&self, data: &[u8]) {
        self.replies.lock().unwrap().push_back(data.to_vec());
    }

    /// Queue a well-formed reply to the next request
    pub fn queue_reply_response(&self, echo: &str, value: &str) {
        self.queue_reply(&Self::response_frame(echo, value));
    }

    /// The next request gets no answer at all
    pub fn queue_silence(&self) {
        self.queue_reply(&[]);
    }

    /// Make reads on an empty buffer wait forever, as a real line does
    pub fn set_stall_when_empty(&self, stall: bool) {
        *self.stall_when_empty.lock().unwrap() = stall;
    }

    /// Make reads on an empty buffer return `byte` endlessly
    pub fn set_noise(&self, byte: u8) {
        *self.noise.lock().unwrap() = Some(byte);
    }

    /// Drop everything queued for reading and return how much was dropped
    pub fn drain_rx(&self) -> usize {
        let mut rx = self.rx_buffer.lock().unwrap();
        let n = rx.len();
        rx.clear();
        n
    }

    /// Get data that was written to the port
    pub fn get_tx_data(&self) -> Vec<u8> {
        self.tx_buffer.lock().unwrap().clone()
    }

    /// Bytes queued but not yet read
    pub fn pending_rx(&self) -> usize {
        self.rx_buffer.lock().unwrap().len()
    }

    /// Clear all buffers
    pub fn clear(&self) {
        self.tx_buffer.lock().unwrap().clear();
        self.rx_buffer.lock().unwrap().clear();
    }

    /// Set an error to be returned on the next read
    pub fn set_next_read_error(&self, error: io::Error) {
        *self.next_read_error.lock().unwrap() = Some(error);
    }

    /// Set an error to be returned on the next write
    pub fn set_next_write_error(&self, error: io::Error) {
        *self.next_write_error.lock().unwrap() = Some(error);
    }

    /// Hand out at most `n` bytes per read, to exercise reassembly
    pub fn set_max_chunk(&self, n: usize) {
        *self.max_chunk.lock().unwrap() = n;
    }
}

// An empty rx buffer reads as end of stream unless noise or stalling is enabled.
impl AsyncRead for MockSerialPort {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(error) = self.next_read_error.lock().unwrap().take() {
            return Poll::Ready(Err(error));
        }

        let max_chunk = *self.max_chunk.lock().unwrap();
        let limit = if max_chunk > 0 {
            buf.remaining().min(max_chunk)
        } else {
            buf.remaining()
        };
        let mut rx = self.rx_buffer.lock().unwrap();
        let available = rx.len().min(limit);

        if available > 0 {
            let data: Vec<u8> = rx.drain(..available).collect();
            buf.put_slice(&data);
        } else if let Some(byte) = *self.noise.lock().unwrap() {
            buf.put_slice(&vec![byte; limit]);
        } else if *self.stall_when_empty.lock().unwrap() {
            return Poll::Pending;
        }

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockSerialPort {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if let Some(error) = self.next_write_error.lock().unwrap().take() {
            return Poll::Ready(Err(error));
        }

        self.tx_buffer.lock().unwrap().extend_from_slice(buf);
        if buf.contains(&ENQ) {
            if let Some(reply) = self.replies.lock().unwrap().pop_front() {
                self.rx_buffer.lock().unwrap().extend(reply);
            }
        }
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_serial_port_creation() {
        let port = MockSerialPort::new();
        assert_eq!(port.get_tx_data().len(), 0);
        assert_eq!(port.pending_rx(), 0);
    }

    #[test]
    fn test_queue_response_frame() {
        let port = MockSerialPort::new();
        port.queue_response("T1", "1.5");

        let rx = port.rx_buffer.lock().unwrap();
        let bytes: Vec<u8> = rx.iter().copied().collect();
        assert_eq!(&bytes[..7], b"\x02T11.5\x03");
        assert_eq!(bytes[7], block_check(b"T11.5\x03"));
    }

    #[tokio::test]
    async fn test_reply_released_by_request() {
        use tokio::io::AsyncWriteExt;

        let mut port = MockSerialPort::new();
        port.queue_reply_response("T1", "1.5");
        assert_eq!(port.pending_rx(), 0);

        port.write_all(b"\x040011T1\x05").await.unwrap();
        assert_eq!(port.pending_rx(), 8);
    }

    #[tokio::test]
    async fn test_noise_after_queued_data() {
        use tokio::io::AsyncReadExt;

        let mut port = MockSerialPort::new();
        port.queue_rx_data(b"\x02");
        port.set_noise(b'A');

        let mut buf = [0u8; 4];
        assert_eq!(port.read(&mut buf).await.unwrap(), 1);
        assert_eq!(port.read(&mut buf).await.unwrap(), 4);
        assert_eq!(&buf, b"AAAA");
    }

    #[test]
    fn test_drain_rx() {
        let port = MockSerialPort::new();
        port.queue_rx_data(b"junk");
        assert_eq!(port.drain_rx(), 4);
        assert_eq!(port.pending_rx(), 0);
    }

    #[test]
    fn test_clear_buffers() {
        let port = MockSerialPort::new();
        port.queue_rx_data(&[1, 2, 3]);
        port.clear();
        assert_eq!(port.pending_rx(), 0);
    }
}
