//! Transaction tests for `Wr3223Session` driven by the mock serial port.

use std::io;
use wr3223_rs::config::{ChecksumMode, SessionConfig};
use wr3223_rs::error::Wr3223Error;
use wr3223_rs::wr3223::serial_mock::MockSerialPort;
use wr3223_rs::wr3223::{SharedSession, Wr3223Session};

fn connected(mock: &MockSerialPort, config: SessionConfig) -> Wr3223Session<MockSerialPort> {
    let mut session = Wr3223Session::new(config).unwrap();
    session.connect_with(mock.clone());
    session
}

fn strict() -> SessionConfig {
    SessionConfig {
        checksum: ChecksumMode::Strict,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_read_one() {
    let mock = MockSerialPort::new();
    mock.queue_reply_response("T3", "  -2.5");
    let mut session = connected(&mock, SessionConfig::default());

    assert_eq!(session.read_one("T3").await.unwrap(), "-2.5");
    assert_eq!(mock.get_tx_data(), b"\x040011T3\x05");
}

#[tokio::test]
async fn test_request_uses_configured_address() {
    let mock = MockSerialPort::new();
    mock.queue_reply_response("MD", "3.");
    let config = SessionConfig {
        address: 45,
        ..Default::default()
    };
    let mut session = connected(&mock, config);

    assert_eq!(session.read_one("MD").await.unwrap(), "3.");
    assert_eq!(mock.get_tx_data(), b"\x044455MD\x05");
}

#[tokio::test]
async fn test_checksum_ignored_by_default() {
    let mock = MockSerialPort::new();
    mock.queue_reply(b"\x02T112.0\x03?");
    let mut session = connected(&mock, SessionConfig::default());

    assert_eq!(session.read_one("T1").await.unwrap(), "12.0");
    assert_eq!(mock.pending_rx(), 0);
}

#[tokio::test]
async fn test_strict_checksum_rejects_bad_bcc() {
    let mock = MockSerialPort::new();
    mock.queue_reply(b"\x02T112.0\x03?");
    let mut session = connected(&mock, strict());

    let err = session.read_one("T1").await.unwrap_err();
    assert!(matches!(err, Wr3223Error::ChecksumMismatch { .. }));
}

#[tokio::test]
async fn test_strict_checksum_accepts_good_bcc() {
    let mock = MockSerialPort::new();
    mock.queue_reply_response("T1", "12.0");
    let mut session = connected(&mock, strict());

    assert_eq!(session.read_one("T1").await.unwrap(), "12.0");
}

#[tokio::test]
async fn test_read_frame() {
    let mock = MockSerialPort::new();
    mock.queue_reply_response("II", "WR3223");
    let mut session = connected(&mock, SessionConfig::default());

    let frame = session.read_frame("II").await.unwrap();
    assert_eq!(frame.echo, "II");
    assert_eq!(frame.value, "WR3223");
    assert_eq!(frame.checksum, frame.calculated);
}

#[tokio::test]
async fn test_nak_is_transport_error() {
    let mock = MockSerialPort::new();
    mock.queue_reply(&[0x15]);
    let mut session = connected(&mock, SessionConfig::default());

    let err = session.read_one("T1").await.unwrap_err();
    assert!(err.is_transport());
    assert!(err.to_string().contains("<NAK>"));
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let mock = MockSerialPort::new();
    mock.set_stall_when_empty(true);
    let config = SessionConfig {
        timeout_ms: 20,
        ..Default::default()
    };
    let mut session = connected(&mock, config);

    let err = session.read_one("T1").await.unwrap_err();
    assert!(err.is_transport());
    assert!(err.to_string().contains("no response within 20 ms"));
}

#[tokio::test]
async fn test_write_error_is_transport_error() {
    let mock = MockSerialPort::new();
    mock.set_next_write_error(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
    let mut session = connected(&mock, SessionConfig::default());

    let err = session.read_one("T1").await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_read_after_disconnect_fails() {
    let mock = MockSerialPort::new();
    mock.queue_reply_response("T1", "1.0");
    let mut session = connected(&mock, SessionConfig::default());
    session.disconnect().await.unwrap();

    assert!(session.read_one("T1").await.unwrap_err().is_transport());
    assert!(mock.get_tx_data().is_empty());
}

#[tokio::test]
async fn test_read_many_partial_failure() {
    let mock = MockSerialPort::new();
    mock.queue_reply_response("T1", "1.0");
    mock.queue_silence();
    mock.queue_reply_response("T3", "3.0");
    let mut session = connected(&mock, SessionConfig::default());

    let results = session.read_many(["T1", "T2", "T3"]).await;
    assert_eq!(results.len(), 2);
    assert_eq!(results["T1"], "1.0");
    assert_eq!(results["T3"], "3.0");
    assert!(!results.contains_key("T2"));
}

#[tokio::test]
async fn test_read_many_skips_invalid_codes() {
    let mock = MockSerialPort::new();
    mock.queue_reply_response("T1", "1.0");
    let mut session = connected(&mock, SessionConfig::default());

    let results = session.read_many(vec!["XYZ".to_string(), "T1".to_string()]).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results["T1"], "1.0");
    // only the valid request reached the line
    assert_eq!(mock.get_tx_data().len(), 8);
}

#[tokio::test]
async fn test_stale_bytes_discarded_after_failure() {
    let mock = MockSerialPort::new();
    // garbage without ETX, then end of stream
    mock.queue_reply(b"\x02T1 1");
    mock.queue_reply_response("T2", "2.0");
    let mut session = connected(&mock, SessionConfig::default());

    assert!(session.read_one("T1").await.is_err());
    assert_eq!(session.read_one("T2").await.unwrap(), "2.0");
}

#[tokio::test]
async fn test_read_all_covers_registry() {
    let mock = MockSerialPort::new();
    for code in wr3223_rs::registry::all_codes() {
        mock.queue_reply_response(code, "0.");
    }
    let mut session = connected(&mock, SessionConfig::default());

    let results = session.read_all().await;
    assert_eq!(results.len(), wr3223_rs::registry::all_codes().len());
    assert_eq!(results["MD"], "0.");
}

#[tokio::test]
async fn test_shared_session_batch() {
    let mock = MockSerialPort::new();
    mock.queue_reply_response("T1", "1.0");
    mock.queue_reply(&[0x04]);
    let shared = SharedSession::new(connected(&mock, SessionConfig::default()));

    let results = shared.read_many(["T1", "T2"]).await;
    assert_eq!(results.len(), 1);
    assert!(shared.is_connected().await);

    shared.disconnect().await.unwrap();
    assert!(!shared.is_connected().await);
}

#[tokio::test]
async fn test_bytes_after_checksum_dropped() {
    let mock = MockSerialPort::new();
    let mut reply = MockSerialPort::response_frame("T1", "1.0");
    reply.extend_from_slice(b"junk");
    mock.queue_reply(&reply);
    mock.queue_reply_response("T2", "2.0");
    let mut session = connected(&mock, SessionConfig::default());

    assert_eq!(session.read_one("T1").await.unwrap(), "1.0");
    assert_eq!(session.read_one("T2").await.unwrap(), "2.0");
}

#[tokio::test]
async fn test_stale_line_input_discarded_before_request() {
    let mock = MockSerialPort::new();
    // a late answer to an earlier request is already waiting on the line
    mock.queue_rx_data(&MockSerialPort::response_frame("T1", "9.9"));
    mock.queue_reply_response("T1", "1.0");
    let mut session = connected(&mock, SessionConfig::default());

    assert_eq!(session.read_one("T1").await.unwrap(), "1.0");
    assert_eq!(mock.pending_rx(), 0);
}

#[tokio::test]
async fn test_noisy_line_does_not_stall_batch() {
    let mock = MockSerialPort::new();
    mock.queue_reply_response("T1", "1.0");
    mock.set_noise(b'A');
    let config = SessionConfig {
        timeout_ms: 20,
        ..Default::default()
    };
    let mut session = connected(&mock, config);

    let results = tokio::time::timeout(
        std::time::Duration::from_millis(500),
        session.read_many(["T1", "T2"]),
    )
    .await
    .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results["T1"], "1.0");
}
