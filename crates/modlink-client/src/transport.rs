//! The two transport capabilities a client can be built over.
//!
//! Concrete implementations live in [`crate::tcp`] and [`crate::serial`];
//! tests inject scripted stand-ins through the same traits.

use std::io;
use std::time::Duration;

/// A connected byte-stream transport, as used by Modbus/TCP.
pub trait StreamTransport {
    /// Establishes the connection. Fails if already connected.
    fn connect(&mut self, host: &str, port: u16) -> io::Result<()>;

    /// Tears the connection down. Idempotent.
    fn disconnect(&mut self) -> io::Result<()>;

    /// Sends as many bytes as the transport accepts and returns the
    /// count; the client loops until the frame is fully written.
    fn send(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Receives up to `buf.len()` bytes, blocking no longer than the
    /// configured receive timeout. Zero means the peer closed.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Bounds every subsequent [`StreamTransport::recv`].
    fn set_recv_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

/// A framed serial device, as used by Modbus RTU.
pub trait SerialDevice {
    /// Opens and configures the port in one step. Fails if already open;
    /// unsupported parameter combinations fail with
    /// [`io::ErrorKind::InvalidInput`].
    fn open(&mut self, config: &SerialConfig) -> io::Result<()>;

    /// Releases the port. Idempotent.
    fn close(&mut self) -> io::Result<()>;

    /// Writes the whole frame; a partial write is an error.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Reads whatever arrives within `timeout`. Zero bytes means the
    /// timeout elapsed, which is not an error at this layer.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Serial line settings. `data_bits` outside 5..=8 and `stop_bits`
/// outside 1..=2 are rejected when the port opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub parity: Parity,
    pub data_bits: u8,
    pub stop_bits: u8,
}

impl SerialConfig {
    /// 8N1 at the given baud rate, the common case.
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            parity: Parity::None,
            data_bits: 8,
            stop_bits: 1,
        }
    }
}
