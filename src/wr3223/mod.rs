//! The wr3223 module contains the components responsible for the WR3223 serial
//! protocol itself: frame building and parsing, and the serial session that
//! runs request/response transactions against a controller.

pub mod frame;
pub mod serial;
pub mod serial_mock;
pub mod shared;

pub use frame::{
    build_read_request, encode_address, extract_value, humanize, parse_response, Address,
    ResponseFrame,
};
pub use serial::{QueryResult, SerialPort, Wr3223Session};
pub use shared::SharedSession;
