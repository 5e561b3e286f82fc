//! Serial-line framing: `[slave_id] [pdu..] [crc_lo, crc_hi]`.

use crate::encoding::Writer;
use crate::frame::MAX_PDU_LEN;
use crate::{DecodeError, EncodeError};

const fn build_crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            if (crc & 0x0001) != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC16_TABLE: [u16; 256] = build_crc16_table();

fn crc16_update(mut crc: u16, data: &[u8]) -> u16 {
    for byte in data {
        let idx = usize::from((crc ^ u16::from(*byte)) & 0x00FF);
        crc = (crc >> 8) ^ CRC16_TABLE[idx];
    }
    crc
}

/// CRC-16/Modbus over `data`: reflected polynomial `0xA001`, seed `0xFFFF`.
pub fn crc16(data: &[u8]) -> u16 {
    crc16_update(0xFFFF, data)
}

/// Frames a PDU for the wire. The CRC covers the slave address and the
/// PDU and is appended low byte first.
pub fn wrap(w: &mut Writer<'_>, slave_id: u8, pdu: &[u8]) -> Result<(), EncodeError> {
    if pdu.len() > MAX_PDU_LEN {
        return Err(EncodeError::PduTooLarge);
    }

    w.write_u8(slave_id)?;
    w.write_all(pdu)?;

    let crc = crc16_update(crc16_update(0xFFFF, &[slave_id]), pdu);
    w.write_all(&crc.to_le_bytes())
}

/// Verifies the trailing CRC and strips address and CRC, returning the
/// PDU. The slave address is not cross-checked against the request; a
/// caller that cares must compare `raw[0]` itself.
pub fn unwrap(raw: &[u8]) -> Result<&[u8], DecodeError> {
    if raw.len() < 4 {
        return Err(DecodeError::FrameTooShort(raw.len()));
    }

    let (payload, crc_bytes) = raw.split_at(raw.len() - 2);
    let got = u16::from_le_bytes([crc_bytes[0], crc_bytes[1]]);
    let expected = crc16(payload);
    if expected != got {
        return Err(DecodeError::CrcMismatch { expected, got });
    }

    Ok(&payload[1..])
}

#[cfg(test)]
mod tests {
    use super::{crc16, unwrap, wrap};
    use crate::encoding::Writer;
    use crate::DecodeError;

    #[test]
    fn crc16_known_vectors() {
        assert_eq!(crc16(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x0A]), 0xCDC5);
        assert_eq!(crc16(&[0x11, 0x01, 0x00, 0x08, 0x00, 0x08]), 0x9EBE);
        assert_eq!(crc16(&[]), 0xFFFF);
    }

    #[test]
    fn crc_trailer_is_little_endian() {
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        wrap(&mut w, 0x11, &[0x03, 0x00, 0x6B, 0x00, 0x03]).unwrap();
        assert_eq!(
            w.as_written(),
            &[0x11, 0x03, 0x00, 0x6B, 0x00, 0x03, 0x76, 0x87]
        );
    }

    #[test]
    fn wrap_unwrap_roundtrip() {
        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        wrap(&mut w, 0x2A, &[0x01, 0x00, 0x13, 0x00, 0x25]).unwrap();

        let pdu = unwrap(w.as_written()).unwrap();
        assert_eq!(pdu, &[0x01, 0x00, 0x13, 0x00, 0x25]);
    }

    #[test]
    fn single_bit_corruption_is_detected() {
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        wrap(&mut w, 0x11, &[0x03, 0x00, 0x6B, 0x00, 0x03]).unwrap();

        let mut tampered = w.as_written().to_vec();
        tampered[3] ^= 0x01;
        assert!(matches!(
            unwrap(&tampered).unwrap_err(),
            DecodeError::CrcMismatch { .. }
        ));
    }

    #[test]
    fn short_frames_are_rejected() {
        assert_eq!(
            unwrap(&[0x11, 0x83, 0x02]).unwrap_err(),
            DecodeError::FrameTooShort(3)
        );
        assert_eq!(unwrap(&[]).unwrap_err(), DecodeError::FrameTooShort(0));
    }
}
