//! Modbus/TCP: the MBAP-framed client façade and the `std::net`-backed
//! stream transport.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use modlink_core::encoding::{Reader, Writer};
use modlink_core::frame::tcp::{self, MbapHeader, MBAP_LEN};
use modlink_core::frame::MAX_PDU_LEN;
use modlink_core::DecodeError;
use tracing::{debug, trace, warn};

use crate::error::{check_slave_id, map_recv_error};
use crate::{Client, Error, StreamTransport, DEFAULT_RESPONSE_TIMEOUT};

/// Blocking TCP transport over a kernel socket.
#[derive(Debug, Default)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn stream_mut(&mut self) -> io::Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "socket is not connected"))
    }
}

impl StreamTransport for TcpTransport {
    fn connect(&mut self, host: &str, port: u16) -> io::Result<()> {
        if self.stream.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "socket is already connected",
            ));
        }
        let stream = TcpStream::connect((host, port))?;
        stream.set_nodelay(true)?;
        self.stream = Some(stream);
        Ok(())
    }

    fn disconnect(&mut self) -> io::Result<()> {
        if let Some(stream) = self.stream.take() {
            // A peer that already dropped the connection makes shutdown
            // fail; the socket is released either way.
            let _ = stream.shutdown(Shutdown::Both);
        }
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.stream_mut()?.write(bytes)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream_mut()?.read(buf)
    }

    fn set_recv_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.stream_mut()?.set_read_timeout(Some(timeout))
    }
}

/// Client façade for the TCP framing.
///
/// Owns its transport for its whole lifetime; dropping the client closes
/// the connection.
#[derive(Debug)]
pub struct TcpClient<T: StreamTransport> {
    transport: T,
    response_timeout: Duration,
    connected: bool,
    next_transaction_id: u16,
}

impl TcpClient<TcpTransport> {
    pub fn new() -> Self {
        Self::with_transport(TcpTransport::new())
    }
}

impl Default for TcpClient<TcpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StreamTransport> TcpClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            connected: false,
            next_transaction_id: 1,
        }
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.response_timeout = timeout;
    }

    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), Error> {
        if self.connected {
            return Err(Error::InvalidArgument("client is already connected"));
        }
        self.transport.connect(host, port).map_err(Error::Transport)?;
        self.connected = true;
        debug!(host, port, "modbus tcp client connected");
        Ok(())
    }

    pub fn disconnect(&mut self) -> Result<(), Error> {
        self.transport.disconnect().map_err(Error::Transport)?;
        self.connected = false;
        Ok(())
    }

    fn next_tid(&mut self) -> u16 {
        let tid = self.next_transaction_id;
        self.next_transaction_id = self.next_transaction_id.wrapping_add(1);
        tid
    }

    fn send_all(&mut self, frame: &[u8]) -> Result<(), Error> {
        let mut sent = 0;
        while sent < frame.len() {
            let n = self
                .transport
                .send(&frame[sent..])
                .map_err(Error::Transport)?;
            if n == 0 {
                return Err(Error::Transport(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "transport accepted no bytes",
                )));
            }
            sent += n;
        }
        Ok(())
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .transport
                .recv(&mut buf[filled..])
                .map_err(map_recv_error)?;
            if n == 0 {
                return Err(Error::Transport(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed the connection mid-response",
                )));
            }
            filled += n;
        }
        Ok(())
    }
}

impl<T: StreamTransport> Client for TcpClient<T> {
    fn send_receive(&mut self, slave_id: u8, request_pdu: &[u8]) -> Result<Vec<u8>, Error> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        check_slave_id(slave_id)?;

        self.transport
            .set_recv_timeout(self.response_timeout)
            .map_err(Error::Transport)?;

        let transaction_id = self.next_tid();
        let mut frame = [0u8; MBAP_LEN + MAX_PDU_LEN];
        let mut w = Writer::new(&mut frame);
        tcp::wrap(&mut w, transaction_id, slave_id, request_pdu)?;

        debug!(
            transaction_id,
            slave_id,
            pdu_len = request_pdu.len(),
            "sending modbus tcp request"
        );
        let frame_len = w.as_written().len();
        self.send_all(&frame[..frame_len])?;

        let mut header_bytes = [0u8; MBAP_LEN];
        self.recv_exact(&mut header_bytes)?;
        let header = MbapHeader::decode(&mut Reader::new(&header_bytes))?;
        if header.transaction_id != transaction_id {
            return Err(Error::MalformedResponse(DecodeError::TransactionIdMismatch {
                expected: transaction_id,
                got: header.transaction_id,
            }));
        }

        // The unit id in the response header is not cross-checked; the
        // transaction id already associates the response.
        let mut pdu = vec![0u8; header.pdu_len()];
        self.recv_exact(&mut pdu)?;
        trace!(transaction_id, pdu_len = pdu.len(), "received modbus tcp response");
        Ok(pdu)
    }
}

impl<T: StreamTransport> Drop for TcpClient<T> {
    fn drop(&mut self) {
        if let Err(err) = self.transport.disconnect() {
            warn!(error = %err, "failed to close tcp transport on drop");
        }
    }
}
