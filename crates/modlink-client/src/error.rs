use modlink_core::pdu::ExceptionCode;
use modlink_core::{DecodeError, EncodeError};
use thiserror::Error;

/// Everything a transaction can fail with, one kind per failure class.
#[derive(Debug, Error)]
pub enum Error {
    /// Quantity out of range, invalid serial parameters, or a bad state
    /// transition such as connecting an already-connected client.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// A transaction was attempted on a disconnected client.
    #[error("client is not connected")]
    NotConnected,
    /// The underlying transport failed: connect error, short write, or a
    /// peer that closed mid-response.
    #[error("transport error: {0}")]
    Transport(#[source] std::io::Error),
    /// The receive deadline elapsed before a complete response arrived.
    #[error("request timed out")]
    Timeout,
    /// An RTU frame arrived with a bad CRC.
    #[error("crc mismatch (computed {expected:#06x}, received {got:#06x})")]
    Integrity { expected: u16, got: u16 },
    /// The response decoded but does not fit the request it answers.
    #[error("malformed response: {0}")]
    MalformedResponse(DecodeError),
    /// The server answered with a Modbus exception.
    #[error("modbus exception: {0:?}")]
    Exception(ExceptionCode),
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::QuantityOutOfRange { .. } => Self::InvalidArgument("quantity out of range"),
            EncodeError::BufferTooSmall | EncodeError::PduTooLarge => {
                Self::InvalidArgument("request pdu exceeds the maximum frame size")
            }
        }
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Exception(code) => Self::Exception(code),
            DecodeError::CrcMismatch { expected, got } => Self::Integrity { expected, got },
            other => Self::MalformedResponse(other),
        }
    }
}

/// Receive-path I/O errors: deadline expiries become [`Error::Timeout`],
/// everything else stays a transport error.
pub(crate) fn map_recv_error(err: std::io::Error) -> Error {
    match err.kind() {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => Error::Timeout,
        _ => Error::Transport(err),
    }
}

/// Unicast slave ids are 1..=247; broadcast 0 is refused because no
/// response would ever arrive.
pub(crate) fn check_slave_id(slave_id: u8) -> Result<(), Error> {
    if slave_id == 0 || slave_id > 247 {
        return Err(Error::InvalidArgument("slave id must be in 1..=247"));
    }
    Ok(())
}
