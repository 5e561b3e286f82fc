//! Modbus RTU: the CRC-framed client façade over a serial device.

use std::io;
use std::time::Duration;

use modlink_core::encoding::Writer;
use modlink_core::frame::rtu;
use modlink_core::frame::MAX_ADU_LEN;
use modlink_core::DecodeError;
use tracing::{debug, trace, warn};

use crate::error::check_slave_id;
use crate::serial::SerialPortDevice;
use crate::{Client, Error, SerialConfig, SerialDevice, DEFAULT_RESPONSE_TIMEOUT};

/// Client façade for the RTU framing.
///
/// Owns its serial device for its whole lifetime; dropping the client
/// releases the port.
#[derive(Debug)]
pub struct RtuClient<S: SerialDevice> {
    device: S,
    response_timeout: Duration,
    connected: bool,
}

impl RtuClient<SerialPortDevice> {
    pub fn new() -> Self {
        Self::with_device(SerialPortDevice::new())
    }
}

impl Default for RtuClient<SerialPortDevice> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SerialDevice> RtuClient<S> {
    pub fn with_device(device: S) -> Self {
        Self {
            device,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            connected: false,
        }
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.response_timeout = timeout;
    }

    pub fn open(&mut self, config: &SerialConfig) -> Result<(), Error> {
        if self.connected {
            return Err(Error::InvalidArgument("client is already connected"));
        }
        self.device.open(config).map_err(|err| {
            if err.kind() == io::ErrorKind::InvalidInput {
                Error::InvalidArgument("invalid serial parameters")
            } else {
                Error::Transport(err)
            }
        })?;
        self.connected = true;
        debug!(port = %config.port, baud = config.baud_rate, "modbus rtu client opened");
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), Error> {
        self.device.close().map_err(Error::Transport)?;
        self.connected = false;
        Ok(())
    }
}

impl<S: SerialDevice> Client for RtuClient<S> {
    fn send_receive(&mut self, slave_id: u8, request_pdu: &[u8]) -> Result<Vec<u8>, Error> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        check_slave_id(slave_id)?;

        let mut frame = [0u8; MAX_ADU_LEN];
        let mut w = Writer::new(&mut frame);
        rtu::wrap(&mut w, slave_id, request_pdu)?;

        debug!(
            slave_id,
            pdu_len = request_pdu.len(),
            "sending modbus rtu request"
        );
        let frame_len = w.as_written().len();
        self.device
            .write_all(&frame[..frame_len])
            .map_err(Error::Transport)?;

        let mut response = [0u8; MAX_ADU_LEN];
        let n = self
            .device
            .read(&mut response, self.response_timeout)
            .map_err(Error::Transport)?;
        if n == 0 {
            return Err(Error::Timeout);
        }

        let pdu = match rtu::unwrap(&response[..n]) {
            Ok(pdu) => pdu,
            Err(DecodeError::FrameTooShort(len)) => {
                return Err(Error::Transport(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("incomplete rtu frame of {len} bytes"),
                )))
            }
            Err(err) => return Err(err.into()),
        };
        trace!(slave_id, pdu_len = pdu.len(), "received modbus rtu response");
        Ok(pdu.to_vec())
    }
}

impl<S: SerialDevice> Drop for RtuClient<S> {
    fn drop(&mut self) {
        if let Err(err) = self.device.close() {
            warn!(error = %err, "failed to close serial device on drop");
        }
    }
}
