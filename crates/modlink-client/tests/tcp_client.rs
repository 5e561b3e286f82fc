//! TCP façade behavior over a scripted stream transport.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use modlink_client::{api, Client, Error, StreamTransport, TcpClient};
use modlink_core::DecodeError;

#[derive(Default)]
struct Inner {
    connected: bool,
    written: Vec<u8>,
    incoming: VecDeque<io::Result<Vec<u8>>>,
    pending: Vec<u8>,
    send_cap: Option<usize>,
    recv_timeout: Option<Duration>,
}

/// Scripted stream: records written bytes, serves queued chunks on recv.
/// An exhausted script behaves like a closed peer.
#[derive(Clone, Default)]
struct ScriptedStream {
    inner: Rc<RefCell<Inner>>,
}

impl ScriptedStream {
    fn push_chunk(&self, chunk: &[u8]) {
        self.inner.borrow_mut().incoming.push_back(Ok(chunk.to_vec()));
    }

    fn push_error(&self, kind: io::ErrorKind) {
        self.inner
            .borrow_mut()
            .incoming
            .push_back(Err(io::Error::from(kind)));
    }

    fn push_frame_split(&self, frame: &[u8]) {
        for byte in frame {
            self.push_chunk(&[*byte]);
        }
    }

    fn cap_sends(&self, cap: usize) {
        self.inner.borrow_mut().send_cap = Some(cap);
    }

    fn written(&self) -> Vec<u8> {
        self.inner.borrow().written.clone()
    }

    fn recv_timeout(&self) -> Option<Duration> {
        self.inner.borrow().recv_timeout
    }
}

impl StreamTransport for ScriptedStream {
    fn connect(&mut self, _host: &str, _port: u16) -> io::Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.connected {
            return Err(io::Error::from(io::ErrorKind::AlreadyExists));
        }
        inner.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> io::Result<()> {
        self.inner.borrow_mut().connected = false;
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.borrow_mut();
        let n = inner.send_cap.map_or(bytes.len(), |cap| cap.min(bytes.len()));
        inner.written.extend_from_slice(&bytes[..n]);
        Ok(n)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.inner.borrow_mut();
        if inner.pending.is_empty() {
            match inner.incoming.pop_front() {
                Some(Ok(chunk)) => inner.pending = chunk,
                Some(Err(err)) => return Err(err),
                None => return Ok(0),
            }
        }
        let n = inner.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&inner.pending[..n]);
        inner.pending.drain(..n);
        Ok(n)
    }

    fn set_recv_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.inner.borrow_mut().recv_timeout = Some(timeout);
        Ok(())
    }
}

fn connected_client() -> (TcpClient<ScriptedStream>, ScriptedStream) {
    let stream = ScriptedStream::default();
    let handle = stream.clone();
    let mut client = TcpClient::with_transport(stream);
    client.connect("device.local", 502).unwrap();
    (client, handle)
}

const READ_HOLDING_PDU: &[u8] = &[0x03, 0x00, 0x6B, 0x00, 0x03];

#[test]
fn golden_frame_on_the_wire() {
    let (mut client, handle) = connected_client();
    handle.push_chunk(&[
        0x00, 0x01, 0x00, 0x00, 0x00, 0x05, 0x11, 0x03, 0x02, 0x00, 0x2A,
    ]);

    let response = client.send_receive(0x11, READ_HOLDING_PDU).unwrap();
    assert_eq!(response, vec![0x03, 0x02, 0x00, 0x2A]);
    assert_eq!(
        handle.written(),
        vec![0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x11, 0x03, 0x00, 0x6B, 0x00, 0x03]
    );
}

#[test]
fn transaction_id_advances_per_request() {
    let (mut client, handle) = connected_client();
    handle.push_chunk(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x05, 0x11, 0x03, 0x02, 0x00, 0x2A]);
    handle.push_chunk(&[0x00, 0x02, 0x00, 0x00, 0x00, 0x05, 0x11, 0x03, 0x02, 0x00, 0x2B]);

    client.send_receive(0x11, READ_HOLDING_PDU).unwrap();
    let second = client.send_receive(0x11, READ_HOLDING_PDU).unwrap();
    assert_eq!(second, vec![0x03, 0x02, 0x00, 0x2B]);

    let written = handle.written();
    assert_eq!(&written[0..2], &[0x00, 0x01]);
    assert_eq!(&written[12..14], &[0x00, 0x02]);
}

#[test]
fn short_sends_are_stitched_together() {
    let (mut client, handle) = connected_client();
    handle.cap_sends(1);
    handle.push_chunk(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x05, 0x11, 0x03, 0x02, 0x00, 0x2A]);

    client.send_receive(0x11, READ_HOLDING_PDU).unwrap();
    assert_eq!(
        handle.written(),
        vec![0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x11, 0x03, 0x00, 0x6B, 0x00, 0x03]
    );
}

#[test]
fn fragmented_response_is_reassembled() {
    let (mut client, handle) = connected_client();
    handle.push_frame_split(&[
        0x00, 0x01, 0x00, 0x00, 0x00, 0x05, 0x11, 0x03, 0x02, 0x00, 0x2A,
    ]);

    let response = client.send_receive(0x11, READ_HOLDING_PDU).unwrap();
    assert_eq!(response, vec![0x03, 0x02, 0x00, 0x2A]);
}

#[test]
fn mismatched_transaction_id_is_malformed() {
    let (mut client, handle) = connected_client();
    handle.push_chunk(&[0x00, 0x09, 0x00, 0x00, 0x00, 0x05, 0x11, 0x03, 0x02, 0x00, 0x2A]);

    let err = client.send_receive(0x11, READ_HOLDING_PDU).unwrap_err();
    assert!(matches!(
        err,
        Error::MalformedResponse(DecodeError::TransactionIdMismatch {
            expected: 1,
            got: 9
        })
    ));
}

#[test]
fn nonzero_protocol_id_is_malformed() {
    let (mut client, handle) = connected_client();
    handle.push_chunk(&[0x00, 0x01, 0x00, 0x01, 0x00, 0x05, 0x11, 0x03, 0x02, 0x00, 0x2A]);

    let err = client.send_receive(0x11, READ_HOLDING_PDU).unwrap_err();
    assert!(matches!(
        err,
        Error::MalformedResponse(DecodeError::InvalidProtocolId(1))
    ));
}

#[test]
fn peer_close_mid_header_is_a_transport_error() {
    let (mut client, handle) = connected_client();
    handle.push_chunk(&[0x00, 0x01, 0x00]);

    let err = client.send_receive(0x11, READ_HOLDING_PDU).unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[test]
fn peer_close_mid_body_is_a_transport_error() {
    let (mut client, handle) = connected_client();
    // Header promises four PDU bytes; only two arrive.
    handle.push_chunk(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x05, 0x11, 0x03, 0x02]);

    let err = client.send_receive(0x11, READ_HOLDING_PDU).unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[test]
fn recv_deadline_maps_to_timeout() {
    let (mut client, handle) = connected_client();
    handle.push_error(io::ErrorKind::TimedOut);

    let err = client.send_receive(0x11, READ_HOLDING_PDU).unwrap_err();
    assert!(matches!(err, Error::Timeout));
}

#[test]
fn configured_timeout_reaches_the_transport() {
    let (mut client, handle) = connected_client();
    client.set_timeout(Duration::from_millis(250));
    handle.push_chunk(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x05, 0x11, 0x03, 0x02, 0x00, 0x2A]);

    client.send_receive(0x11, READ_HOLDING_PDU).unwrap();
    assert_eq!(handle.recv_timeout(), Some(Duration::from_millis(250)));
}

#[test]
fn transaction_requires_a_connection() {
    let mut client = TcpClient::with_transport(ScriptedStream::default());
    let err = client.send_receive(0x11, READ_HOLDING_PDU).unwrap_err();
    assert!(matches!(err, Error::NotConnected));
}

#[test]
fn connect_twice_is_rejected() {
    let (mut client, _handle) = connected_client();
    let err = client.connect("device.local", 502).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn disconnect_is_idempotent_and_blocks_traffic() {
    let (mut client, _handle) = connected_client();
    client.disconnect().unwrap();
    client.disconnect().unwrap();

    let err = client.send_receive(0x11, READ_HOLDING_PDU).unwrap_err();
    assert!(matches!(err, Error::NotConnected));
}

#[test]
fn broadcast_and_reserved_slave_ids_are_rejected() {
    let (mut client, _handle) = connected_client();
    for slave_id in [0u8, 248] {
        let err = client.send_receive(slave_id, READ_HOLDING_PDU).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}

#[test]
fn typed_read_over_tcp() {
    let (mut client, handle) = connected_client();
    handle.push_chunk(&[
        0x00, 0x01, 0x00, 0x00, 0x00, 0x09, 0x11, 0x03, 0x06, 0x02, 0x2B, 0x00, 0x00, 0x00, 0x64,
    ]);

    let values = api::read_holding_registers(&mut client, 0x11, 0x006B, 3).unwrap();
    assert_eq!(values, vec![0x022B, 0x0000, 0x0064]);
}
