//! Serial device backed by the `serialport` crate.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::SerialPort;

use crate::transport::{Parity, SerialConfig, SerialDevice};

/// A serial port opened from a [`SerialConfig`]. All line settings go
/// through the builder in one shot, so the port is never left in a
/// half-configured state.
#[derive(Default)]
pub struct SerialPortDevice {
    port: Option<Box<dyn SerialPort>>,
}

impl SerialPortDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn port_mut(&mut self) -> io::Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial port is not open"))
    }
}

impl std::fmt::Debug for SerialPortDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortDevice")
            .field("open", &self.port.is_some())
            .finish()
    }
}

fn map_parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Even => serialport::Parity::Even,
        Parity::Odd => serialport::Parity::Odd,
    }
}

fn map_data_bits(data_bits: u8) -> io::Result<serialport::DataBits> {
    match data_bits {
        5 => Ok(serialport::DataBits::Five),
        6 => Ok(serialport::DataBits::Six),
        7 => Ok(serialport::DataBits::Seven),
        8 => Ok(serialport::DataBits::Eight),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "data bits must be 5..=8",
        )),
    }
}

fn map_stop_bits(stop_bits: u8) -> io::Result<serialport::StopBits> {
    match stop_bits {
        1 => Ok(serialport::StopBits::One),
        2 => Ok(serialport::StopBits::Two),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "stop bits must be 1 or 2",
        )),
    }
}

impl SerialDevice for SerialPortDevice {
    fn open(&mut self, config: &SerialConfig) -> io::Result<()> {
        if self.port.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "serial port is already open",
            ));
        }

        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .parity(map_parity(config.parity))
            .data_bits(map_data_bits(config.data_bits)?)
            .stop_bits(map_stop_bits(config.stop_bits)?)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(io::Error::from)?;

        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        // Dropping the handle releases the descriptor.
        self.port = None;
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port_mut()?.write_all(bytes)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        let port = self.port_mut()?;
        port.set_timeout(timeout).map_err(io::Error::from)?;
        match port.read(buf) {
            Ok(n) => Ok(n),
            // The trait reports an elapsed deadline as a zero-byte read.
            Err(err) if err.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{map_data_bits, map_stop_bits, SerialPortDevice};
    use crate::transport::SerialDevice;
    use std::io;

    #[test]
    fn unsupported_line_settings_are_invalid_input() {
        assert_eq!(
            map_data_bits(9).unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
        assert_eq!(
            map_stop_bits(0).unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
        assert_eq!(
            map_stop_bits(3).unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
    }

    #[test]
    fn io_on_a_closed_port_reports_not_connected() {
        let mut device = SerialPortDevice::new();
        let err = device.write_all(&[0x00]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn close_is_idempotent() {
        let mut device = SerialPortDevice::new();
        device.close().unwrap();
        device.close().unwrap();
    }
}
