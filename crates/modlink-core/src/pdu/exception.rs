//! Exception-response detection and classification.

use crate::DecodeError;

/// Bit 7 of the function byte marks an exception response.
pub const EXCEPTION_BIT: u8 = 0x80;

/// Exception codes a server may answer with. Codes outside the named set
/// are passed through untouched as [`ExceptionCode::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionCode {
    IllegalFunction,
    IllegalDataAddress,
    IllegalDataValue,
    ServerDeviceFailure,
    Acknowledge,
    ServerDeviceBusy,
    MemoryParityError,
    GatewayPathUnavailable,
    GatewayTargetDeviceFailedToRespond,
    Other(u8),
}

impl ExceptionCode {
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x01 => Self::IllegalFunction,
            0x02 => Self::IllegalDataAddress,
            0x03 => Self::IllegalDataValue,
            0x04 => Self::ServerDeviceFailure,
            0x05 => Self::Acknowledge,
            0x06 => Self::ServerDeviceBusy,
            0x08 => Self::MemoryParityError,
            0x0A => Self::GatewayPathUnavailable,
            0x0B => Self::GatewayTargetDeviceFailedToRespond,
            other => Self::Other(other),
        }
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            Self::IllegalFunction => 0x01,
            Self::IllegalDataAddress => 0x02,
            Self::IllegalDataValue => 0x03,
            Self::ServerDeviceFailure => 0x04,
            Self::Acknowledge => 0x05,
            Self::ServerDeviceBusy => 0x06,
            Self::MemoryParityError => 0x08,
            Self::GatewayPathUnavailable => 0x0A,
            Self::GatewayTargetDeviceFailedToRespond => 0x0B,
            Self::Other(raw) => raw,
        }
    }
}

/// Inspects a response PDU for the exception bit.
///
/// Returns `Exception` when the PDU is a well-formed exception response
/// and `TruncatedException` when the bit is set but the code byte is
/// missing. A clear exception bit passes.
pub fn check(pdu: &[u8]) -> Result<(), DecodeError> {
    let Some(&function_byte) = pdu.first() else {
        return Err(DecodeError::UnexpectedEof);
    };
    if function_byte & EXCEPTION_BIT == 0 {
        return Ok(());
    }
    match pdu.get(1) {
        Some(&code) => Err(DecodeError::Exception(ExceptionCode::from_u8(code))),
        None => Err(DecodeError::TruncatedException),
    }
}
