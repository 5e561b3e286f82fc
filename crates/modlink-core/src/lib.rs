//! Modbus wire-level encoding in pure Rust.
//!
//! `modlink-core` covers the transport-agnostic half of a Modbus client:
//! the per-function PDU codec, the RTU framing (slave address + CRC-16)
//! and the TCP framing (MBAP header). It performs no I/O; the companion
//! `modlink-client` crate drives these codecs over real transports.

#![forbid(unsafe_code)]

pub mod encoding;
pub mod error;
pub mod frame;
pub mod pdu;

pub use error::{DecodeError, EncodeError};
