//! # WR3223 Frame Codec
//!
//! This module builds read requests and takes apart responses of the WR3223
//! serial protocol. Both directions are plain ASCII framed by control bytes:
//!
//! ```text
//! request:  EOT A A B B C C ENQ        (AABB = doubled address digits, CC = code)
//! response: STX E E v a l u e ETX BCC  (EE = echo of the code, BCC = block check)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use wr3223_rs::wr3223::frame::{build_read_request, extract_value};
//!
//! let request = build_read_request(1, "T1").unwrap();
//! assert_eq!(request, b"\x040011T1\x05");
//!
//! let value = extract_value(b"\x02T1 23.5\x03");
//! assert_eq!(value, "23.5");
//! ```
//!
//! `extract_value` is the lenient path used by the transport: it never fails
//! and simply strips the framing. `parse_response` is the strict path, built
//! on `nom`, which rejects anything that is not `STX echo payload ETX BCC`.

use crate::constants::{
    COMMAND_CODE_LEN, CONTROL_MNEMONICS, ECHO_FIELD_LEN, ENQ, EOT, ETX, MAX_ADDRESS, STX,
};
use crate::error::Wr3223Error;
use crate::registry::{self, CommandSpec};
use nom::bytes::complete::{tag, take, take_till};
use nom::number::complete::be_u8;
use nom::IResult;
use std::fmt;

/// Address of a controller on the bus, always within 0..=99.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(u8);

impl Address {
    /// Validates `value` against the 0..=99 range.
    pub fn new(value: i64) -> Result<Self, Wr3223Error> {
        if !(0..=MAX_ADDRESS).contains(&value) {
            return Err(Wr3223Error::InvalidAddress(value));
        }
        Ok(Address(value as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Wire form of the address: tens digit twice, then ones digit twice.
    pub fn encode(&self) -> [u8; 4] {
        let tens = b'0' + self.0 / 10;
        let ones = b'0' + self.0 % 10;
        [tens, tens, ones, ones]
    }
}

impl TryFrom<i64> for Address {
    type Error = Wr3223Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Address::new(value)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// A strictly parsed response frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    /// The two characters following STX, normally the echoed command code.
    pub echo: String,
    /// Payload between the echo field and ETX, trimmed.
    pub value: String,
    /// The byte transmitted after ETX.
    pub checksum: u8,
    /// Block check computed over the received echo, payload and ETX.
    pub calculated: u8,
}

impl ResponseFrame {
    /// Fails with `ChecksumMismatch` when the transmitted BCC differs from
    /// the one computed over the frame.
    pub fn verify(&self) -> Result<(), Wr3223Error> {
        if self.checksum != self.calculated {
            return Err(Wr3223Error::ChecksumMismatch {
                expected: self.checksum,
                calculated: self.calculated,
            });
        }
        Ok(())
    }
}

/// Encodes an address as its 4-character wire form, e.g. 2 -> "0022".
pub fn encode_address(address: i64) -> Result<String, Wr3223Error> {
    let encoded = Address::new(address)?.encode();
    Ok(encoded.iter().map(|&b| b as char).collect())
}

/// Checks that `code` is two characters long and registered.
pub fn validate_code(code: &str) -> Result<&'static CommandSpec, Wr3223Error> {
    if code.len() != COMMAND_CODE_LEN || !code.is_ascii() {
        return Err(Wr3223Error::InvalidCommand(format!(
            "{code:?} must have exactly {COMMAND_CODE_LEN} ASCII characters"
        )));
    }
    registry::lookup(code)
        .ok_or_else(|| Wr3223Error::InvalidCommand(format!("{code:?} is not a known command")))
}

/// Builds `EOT + address + code + ENQ` for an already validated address.
pub fn read_request(address: Address, code: &str) -> Result<Vec<u8>, Wr3223Error> {
    let spec = validate_code(code)?;
    let mut request = Vec::with_capacity(8);
    request.push(EOT);
    request.extend_from_slice(&address.encode());
    request.extend_from_slice(spec.code.as_bytes());
    request.push(ENQ);
    Ok(request)
}

/// Builds the read request for `code` at `address`.
pub fn build_read_request(address: i64, code: &str) -> Result<Vec<u8>, Wr3223Error> {
    read_request(Address::new(address)?, code)
}

/// Extracts the value from a response: STX and ETX are removed, the two
/// echo characters after STX are dropped and surrounding whitespace trimmed.
///
/// Never fails; malformed input yields whatever is left after the surgery.
pub fn extract_value(raw: &[u8]) -> String {
    let stripped: String = String::from_utf8_lossy(raw)
        .chars()
        .filter(|&c| c != STX as char && c != ETX as char)
        .skip(ECHO_FIELD_LEN)
        .collect();
    stripped.trim().to_string()
}

/// Replaces control bytes with bracketed mnemonics for log output.
pub fn humanize(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for &byte in raw {
        match CONTROL_MNEMONICS.iter().find(|(ctrl, _)| *ctrl == byte) {
            Some((_, mnemonic)) => out.push_str(mnemonic),
            None => out.push(byte as char),
        }
    }
    out
}

/// X3.28 block check: XOR of every byte after STX up to and including ETX.
pub fn block_check(covered: &[u8]) -> u8 {
    covered.iter().fold(0u8, |acc, b| acc ^ b)
}

/// Index of the checksum byte, i.e. one past the first ETX, if both are present.
pub fn checksum_position(buf: &[u8]) -> Option<usize> {
    let etx = buf.iter().position(|&b| b == ETX)?;
    if buf.len() > etx + 1 {
        Some(etx + 1)
    } else {
        None
    }
}

fn response_parts(input: &[u8]) -> IResult<&[u8], (&[u8], &[u8], u8)> {
    let (input, _) = tag(&[STX][..])(input)?;
    let (input, echo) = take(ECHO_FIELD_LEN)(input)?;
    let (input, payload) = take_till(|b: u8| b == ETX)(input)?;
    let (input, _) = tag(&[ETX][..])(input)?;
    let (input, checksum) = be_u8(input)?;
    Ok((input, (echo, payload, checksum)))
}

/// Strictly parses `STX echo payload ETX BCC`.
pub fn parse_response(raw: &[u8]) -> Result<ResponseFrame, Wr3223Error> {
    let (rest, (echo, payload, checksum)) = response_parts(raw).map_err(|e| {
        Wr3223Error::MalformedFrame(format!("{} ({e:?})", humanize(raw)))
    })?;
    if !rest.is_empty() {
        return Err(Wr3223Error::MalformedFrame(format!(
            "{} trailing bytes after checksum",
            rest.len()
        )));
    }

    // echo and payload are contiguous in the input, followed by ETX
    let covered = &raw[1..1 + echo.len() + payload.len() + 1];
    Ok(ResponseFrame {
        echo: String::from_utf8_lossy(echo).into_owned(),
        value: String::from_utf8_lossy(payload).trim().to_string(),
        checksum,
        calculated: block_check(covered),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(body: &[u8]) -> Vec<u8> {
        let mut out = vec![STX];
        out.extend_from_slice(body);
        out.push(ETX);
        let bcc = block_check(&out[1..]);
        out.push(bcc);
        out
    }

    #[test]
    fn test_address_encoding() {
        assert_eq!(encode_address(2).unwrap(), "0022");
        assert_eq!(encode_address(45).unwrap(), "4455");
        assert_eq!(encode_address(0).unwrap(), "0000");
        assert_eq!(encode_address(99).unwrap(), "9999");
    }

    #[test]
    fn test_address_out_of_range() {
        assert!(matches!(encode_address(-1), Err(Wr3223Error::InvalidAddress(-1))));
        assert!(matches!(encode_address(100), Err(Wr3223Error::InvalidAddress(100))));
    }

    #[test]
    fn test_build_read_request_t1() {
        let request = build_read_request(1, "T1").unwrap();
        assert_eq!(request, vec![0x04, 0x30, 0x30, 0x31, 0x31, 0x54, 0x31, 0x05]);
    }

    #[test]
    fn test_build_read_request_rejects_codes() {
        assert!(matches!(build_read_request(1, "T12"), Err(Wr3223Error::InvalidCommand(_))));
        assert!(matches!(build_read_request(1, "XX"), Err(Wr3223Error::InvalidCommand(_))));
        assert!(matches!(build_read_request(1, ""), Err(Wr3223Error::InvalidCommand(_))));
    }

    #[test]
    fn test_address_checked_before_code() {
        assert!(matches!(build_read_request(100, "T1"), Err(Wr3223Error::InvalidAddress(100))));
    }

    #[test]
    fn test_extract_value() {
        assert_eq!(extract_value(b"\x02XX23.5\x03"), "23.5");
        assert_eq!(extract_value(b"\x02T1  -4.5 \x03"), "-4.5");
        assert_eq!(extract_value(b"\x02MD-125.\x03"), "-125.");
    }

    #[test]
    fn test_extract_value_is_lenient() {
        assert_eq!(extract_value(b""), "");
        assert_eq!(extract_value(b"\x02T"), "");
        assert_eq!(extract_value(b"ab 1"), "1");
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize(b"\x040011T1\x05"), "<EOT>0011T1<ENQ>");
        assert_eq!(humanize(&[0x06, 0x15]), "<ACK><NAK>");
    }

    #[test]
    fn test_checksum_position() {
        assert_eq!(checksum_position(b"\x02T11.\x03"), None);
        assert_eq!(checksum_position(b"\x02T11.\x03C"), Some(6));
        assert_eq!(checksum_position(b"\x02T11."), None);
    }

    #[test]
    fn test_parse_response() {
        let raw = frame(b"T3 12.5");
        let parsed = parse_response(&raw).unwrap();
        assert_eq!(parsed.echo, "T3");
        assert_eq!(parsed.value, "12.5");
        assert!(parsed.verify().is_ok());
    }

    #[test]
    fn test_parse_response_bad_checksum() {
        let mut raw = frame(b"T3 12.5");
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let parsed = parse_response(&raw).unwrap();
        assert!(matches!(parsed.verify(), Err(Wr3223Error::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_parse_response_malformed() {
        assert!(matches!(parse_response(b"T3 12.5\x03x"), Err(Wr3223Error::MalformedFrame(_))));
        assert!(matches!(parse_response(b"\x02T3 12.5"), Err(Wr3223Error::MalformedFrame(_))));
        assert!(matches!(parse_response(b"\x02T3 1\x03"), Err(Wr3223Error::MalformedFrame(_))));
    }
}
