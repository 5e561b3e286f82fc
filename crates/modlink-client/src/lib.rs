//! Synchronous Modbus client for the RTU and TCP framings.
//!
//! A client owns its transport exclusively and runs one blocking
//! request/response transaction at a time. The transports are injected
//! behind two narrow traits ([`StreamTransport`] for TCP,
//! [`SerialDevice`] for RTU), with ready-made implementations over
//! `std::net` and the `serialport` crate.
//!
//! ```no_run
//! use modlink_client::{api, TcpClient};
//!
//! let mut client = TcpClient::new();
//! client.connect("10.0.0.5", 502)?;
//! let registers = api::read_holding_registers(&mut client, 1, 0x006B, 3)?;
//! client.disconnect()?;
//! # Ok::<(), modlink_client::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod error;
pub mod rtu;
pub mod serial;
pub mod tcp;
pub mod transport;

use std::time::Duration;

pub use error::Error;
pub use rtu::RtuClient;
pub use serial::SerialPortDevice;
pub use tcp::{TcpClient, TcpTransport};
pub use transport::{Parity, SerialConfig, SerialDevice, StreamTransport};

/// Response timeout a freshly created client starts with.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(1000);

/// One blocking Modbus transaction against a single slave.
///
/// `request_pdu` is the function-code-led request PDU; the returned bytes
/// are the full response PDU with the function byte (and a possible
/// exception bit) intact. Framing, integrity checks and timeouts happen
/// behind this call; interpreting the payload is the caller's job —
/// usually via the typed [`api`] functions.
pub trait Client {
    fn send_receive(&mut self, slave_id: u8, request_pdu: &[u8]) -> Result<Vec<u8>, Error>;
}
