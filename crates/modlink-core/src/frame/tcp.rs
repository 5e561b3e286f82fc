//! Modbus/TCP framing: the 7-byte MBAP header followed by the PDU.

use crate::encoding::{Reader, Writer};
use crate::frame::MAX_PDU_LEN;
use crate::{DecodeError, EncodeError};

pub const MBAP_LEN: usize = 7;

/// MBAP header fields, all big-endian on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbapHeader {
    pub transaction_id: u16,
    pub protocol_id: u16,
    /// Counts the unit-id byte plus the PDU.
    pub length: u16,
    pub unit_id: u8,
}

impl MbapHeader {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u16(self.transaction_id)?;
        w.write_u16(self.protocol_id)?;
        w.write_u16(self.length)?;
        w.write_u8(self.unit_id)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let transaction_id = r.read_u16()?;
        let protocol_id = r.read_u16()?;
        let length = r.read_u16()?;
        let unit_id = r.read_u8()?;

        if protocol_id != 0 {
            return Err(DecodeError::InvalidProtocolId(protocol_id));
        }
        if length < 2 || usize::from(length) > 1 + MAX_PDU_LEN {
            return Err(DecodeError::InvalidLength);
        }

        Ok(Self {
            transaction_id,
            protocol_id,
            length,
            unit_id,
        })
    }

    /// PDU size announced by the header.
    pub fn pdu_len(&self) -> usize {
        usize::from(self.length) - 1
    }
}

/// Frames a PDU for the wire: MBAP header (`length = 1 + pdu.len()`,
/// protocol id zero) followed by the PDU itself.
pub fn wrap(
    w: &mut Writer<'_>,
    transaction_id: u16,
    unit_id: u8,
    pdu: &[u8],
) -> Result<(), EncodeError> {
    if pdu.len() > MAX_PDU_LEN {
        return Err(EncodeError::PduTooLarge);
    }

    let header = MbapHeader {
        transaction_id,
        protocol_id: 0,
        length: pdu.len() as u16 + 1,
        unit_id,
    };
    header.encode(w)?;
    w.write_all(pdu)
}

#[cfg(test)]
mod tests {
    use super::{wrap, MbapHeader};
    use crate::encoding::{Reader, Writer};
    use crate::DecodeError;

    #[test]
    fn wrap_emits_golden_frame() {
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        wrap(&mut w, 1, 1, &[0x03, 0x00, 0x6B, 0x00, 0x03]).unwrap();
        assert_eq!(
            w.as_written(),
            &[0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x6B, 0x00, 0x03]
        );
    }

    #[test]
    fn header_roundtrip() {
        let header = MbapHeader {
            transaction_id: 0x0102,
            protocol_id: 0,
            length: 6,
            unit_id: 0x11,
        };
        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf);
        header.encode(&mut w).unwrap();

        let mut r = Reader::new(w.as_written());
        let decoded = MbapHeader::decode(&mut r).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.pdu_len(), 5);
    }

    #[test]
    fn rejects_nonzero_protocol_id() {
        let bytes = [0x00, 0x01, 0x00, 0x01, 0x00, 0x06, 0x01];
        let mut r = Reader::new(&bytes);
        assert_eq!(
            MbapHeader::decode(&mut r).unwrap_err(),
            DecodeError::InvalidProtocolId(1)
        );
    }

    #[test]
    fn rejects_degenerate_length() {
        // length 1 would mean a unit id with no PDU at all.
        let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x01];
        let mut r = Reader::new(&bytes);
        assert_eq!(
            MbapHeader::decode(&mut r).unwrap_err(),
            DecodeError::InvalidLength
        );
    }
}
