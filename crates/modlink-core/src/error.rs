use core::fmt;

use crate::pdu::ExceptionCode;

/// Errors that can occur while encoding a request into an output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// A read or write quantity is zero or above the per-function maximum.
    QuantityOutOfRange { quantity: u16, max: u16 },
    BufferTooSmall,
    /// The PDU would exceed the 253-byte Modbus limit.
    PduTooLarge,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuantityOutOfRange { quantity, max } => {
                write!(f, "quantity {quantity} out of range 1..={max}")
            }
            Self::BufferTooSmall => f.write_str("output buffer too small"),
            Self::PduTooLarge => f.write_str("pdu exceeds 253 bytes"),
        }
    }
}

impl std::error::Error for EncodeError {}

/// Errors that can occur while decoding a response.
///
/// Variants carry the expected and observed values so callers and tests
/// can tell a size defect from a content defect without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    UnexpectedEof,
    /// The function byte is not one of the eight supported codes.
    UnknownFunction(u8),
    /// The response function byte does not echo the request.
    FunctionMismatch { expected: u8, got: u8 },
    /// The response body has the wrong total size.
    LengthMismatch { expected: usize, actual: usize },
    /// The leading byte-count field disagrees with the requested quantity.
    ByteCountMismatch { expected: u8, actual: u8 },
    /// A write response did not echo the request body.
    EchoMismatch,
    /// Exception bit set but no exception code byte followed.
    TruncatedException,
    /// The server answered with an exception response.
    Exception(ExceptionCode),
    /// An RTU frame failed its CRC check.
    CrcMismatch { expected: u16, got: u16 },
    /// An RTU frame shorter than the 4-byte minimum (address + function + CRC).
    FrameTooShort(usize),
    /// The MBAP protocol id was not zero.
    InvalidProtocolId(u16),
    /// The MBAP transaction id does not echo the request.
    TransactionIdMismatch { expected: u16, got: u16 },
    /// An MBAP length field that cannot describe a valid PDU.
    InvalidLength,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => f.write_str("unexpected end of input"),
            Self::UnknownFunction(code) => write!(f, "unknown function code {code:#04x}"),
            Self::FunctionMismatch { expected, got } => {
                write!(f, "function byte {got:#04x} does not echo request {expected:#04x}")
            }
            Self::LengthMismatch { expected, actual } => {
                write!(f, "response body is {actual} bytes, expected {expected}")
            }
            Self::ByteCountMismatch { expected, actual } => {
                write!(f, "byte count field is {actual}, expected {expected}")
            }
            Self::EchoMismatch => f.write_str("write response does not echo the request"),
            Self::TruncatedException => f.write_str("exception response shorter than two bytes"),
            Self::Exception(code) => write!(f, "server exception {:#04x}", code.as_u8()),
            Self::CrcMismatch { expected, got } => {
                write!(f, "crc mismatch (computed {expected:#06x}, received {got:#06x})")
            }
            Self::FrameTooShort(len) => write!(f, "rtu frame of {len} bytes is too short"),
            Self::InvalidProtocolId(id) => write!(f, "mbap protocol id {id:#06x} is not zero"),
            Self::TransactionIdMismatch { expected, got } => {
                write!(f, "transaction id {got} does not echo request {expected}")
            }
            Self::InvalidLength => f.write_str("invalid mbap length field"),
        }
    }
}

impl std::error::Error for DecodeError {}
