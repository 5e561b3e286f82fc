//! Per-function request encoders and response decoders.
//!
//! Each operation is a small request struct whose `encode` emits the
//! function byte and body, and whose `decode_response` validates the
//! paired response PDU (function byte included) against the request it
//! was built from.

use crate::encoding::{Reader, Writer};
use crate::pdu::{bits, exception, FunctionCode};
use crate::{DecodeError, EncodeError};

pub const MAX_READ_BITS: u16 = 2000;
pub const MAX_READ_REGISTERS: u16 = 125;
pub const MAX_WRITE_COILS: u16 = 1968;
pub const MAX_WRITE_REGISTERS: u16 = 123;

fn validate_quantity(quantity: u16, max: u16) -> Result<(), EncodeError> {
    if quantity == 0 || quantity > max {
        return Err(EncodeError::QuantityOutOfRange { quantity, max });
    }
    Ok(())
}

/// Checks the exception bit and the function-byte echo, then hands back a
/// reader positioned at the response body.
fn begin_decode(function: FunctionCode, pdu: &[u8]) -> Result<Reader<'_>, DecodeError> {
    exception::check(pdu)?;
    let mut r = Reader::new(pdu);
    let got = r.read_u8()?;
    if got != function.as_u8() {
        return Err(DecodeError::FunctionMismatch {
            expected: function.as_u8(),
            got,
        });
    }
    Ok(r)
}

fn decode_bit_body(r: &mut Reader<'_>, quantity: u16) -> Result<Vec<bool>, DecodeError> {
    let data_len = bits::packed_len(usize::from(quantity));
    if r.remaining() != 1 + data_len {
        return Err(DecodeError::LengthMismatch {
            expected: 1 + data_len,
            actual: r.remaining(),
        });
    }
    let byte_count = r.read_u8()?;
    if usize::from(byte_count) != data_len {
        return Err(DecodeError::ByteCountMismatch {
            expected: data_len as u8,
            actual: byte_count,
        });
    }
    Ok(bits::unpack(r.take(data_len)?, usize::from(quantity)))
}

fn decode_register_body(r: &mut Reader<'_>, quantity: u16) -> Result<Vec<u16>, DecodeError> {
    let data_len = usize::from(quantity) * 2;
    if r.remaining() != 1 + data_len {
        return Err(DecodeError::LengthMismatch {
            expected: 1 + data_len,
            actual: r.remaining(),
        });
    }
    let byte_count = r.read_u8()?;
    if usize::from(byte_count) != data_len {
        return Err(DecodeError::ByteCountMismatch {
            expected: data_len as u8,
            actual: byte_count,
        });
    }
    let mut values = Vec::with_capacity(usize::from(quantity));
    for _ in 0..quantity {
        values.push(r.read_u16()?);
    }
    Ok(values)
}

/// The remaining body must match `expected` byte for byte.
fn decode_echo_body(r: &mut Reader<'_>, expected: &[u8]) -> Result<(), DecodeError> {
    if r.remaining() != expected.len() {
        return Err(DecodeError::LengthMismatch {
            expected: expected.len(),
            actual: r.remaining(),
        });
    }
    if r.take(expected.len())? != expected {
        return Err(DecodeError::EchoMismatch);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadCoils {
    pub start_address: u16,
    pub quantity: u16,
}

impl ReadCoils {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        validate_quantity(self.quantity, MAX_READ_BITS)?;
        w.write_u8(FunctionCode::ReadCoils.as_u8())?;
        w.write_u16(self.start_address)?;
        w.write_u16(self.quantity)
    }

    pub fn decode_response(&self, pdu: &[u8]) -> Result<Vec<bool>, DecodeError> {
        let mut r = begin_decode(FunctionCode::ReadCoils, pdu)?;
        decode_bit_body(&mut r, self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadDiscreteInputs {
    pub start_address: u16,
    pub quantity: u16,
}

impl ReadDiscreteInputs {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        validate_quantity(self.quantity, MAX_READ_BITS)?;
        w.write_u8(FunctionCode::ReadDiscreteInputs.as_u8())?;
        w.write_u16(self.start_address)?;
        w.write_u16(self.quantity)
    }

    pub fn decode_response(&self, pdu: &[u8]) -> Result<Vec<bool>, DecodeError> {
        let mut r = begin_decode(FunctionCode::ReadDiscreteInputs, pdu)?;
        decode_bit_body(&mut r, self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadHoldingRegisters {
    pub start_address: u16,
    pub quantity: u16,
}

impl ReadHoldingRegisters {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        validate_quantity(self.quantity, MAX_READ_REGISTERS)?;
        w.write_u8(FunctionCode::ReadHoldingRegisters.as_u8())?;
        w.write_u16(self.start_address)?;
        w.write_u16(self.quantity)
    }

    pub fn decode_response(&self, pdu: &[u8]) -> Result<Vec<u16>, DecodeError> {
        let mut r = begin_decode(FunctionCode::ReadHoldingRegisters, pdu)?;
        decode_register_body(&mut r, self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadInputRegisters {
    pub start_address: u16,
    pub quantity: u16,
}

impl ReadInputRegisters {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        validate_quantity(self.quantity, MAX_READ_REGISTERS)?;
        w.write_u8(FunctionCode::ReadInputRegisters.as_u8())?;
        w.write_u16(self.start_address)?;
        w.write_u16(self.quantity)
    }

    pub fn decode_response(&self, pdu: &[u8]) -> Result<Vec<u16>, DecodeError> {
        let mut r = begin_decode(FunctionCode::ReadInputRegisters, pdu)?;
        decode_register_body(&mut r, self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSingleCoil {
    pub address: u16,
    pub value: bool,
}

impl WriteSingleCoil {
    fn body(&self) -> [u8; 4] {
        let [addr_hi, addr_lo] = self.address.to_be_bytes();
        [addr_hi, addr_lo, if self.value { 0xFF } else { 0x00 }, 0x00]
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8(FunctionCode::WriteSingleCoil.as_u8())?;
        w.write_all(&self.body())
    }

    /// The server echoes the request body verbatim.
    pub fn decode_response(&self, pdu: &[u8]) -> Result<(), DecodeError> {
        let mut r = begin_decode(FunctionCode::WriteSingleCoil, pdu)?;
        decode_echo_body(&mut r, &self.body())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSingleRegister {
    pub address: u16,
    pub value: u16,
}

impl WriteSingleRegister {
    fn body(&self) -> [u8; 4] {
        let [addr_hi, addr_lo] = self.address.to_be_bytes();
        let [val_hi, val_lo] = self.value.to_be_bytes();
        [addr_hi, addr_lo, val_hi, val_lo]
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8(FunctionCode::WriteSingleRegister.as_u8())?;
        w.write_all(&self.body())
    }

    /// The server echoes the request body verbatim.
    pub fn decode_response(&self, pdu: &[u8]) -> Result<(), DecodeError> {
        let mut r = begin_decode(FunctionCode::WriteSingleRegister, pdu)?;
        decode_echo_body(&mut r, &self.body())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteMultipleCoils<'a> {
    pub start_address: u16,
    pub values: &'a [bool],
}

impl<'a> WriteMultipleCoils<'a> {
    pub fn quantity(&self) -> Result<u16, EncodeError> {
        let quantity = u16::try_from(self.values.len()).unwrap_or(u16::MAX);
        validate_quantity(quantity, MAX_WRITE_COILS)?;
        Ok(quantity)
    }

    fn echo(&self, quantity: u16) -> [u8; 4] {
        let [addr_hi, addr_lo] = self.start_address.to_be_bytes();
        let [qty_hi, qty_lo] = quantity.to_be_bytes();
        [addr_hi, addr_lo, qty_hi, qty_lo]
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let quantity = self.quantity()?;
        let byte_count = bits::packed_len(self.values.len());

        w.write_u8(FunctionCode::WriteMultipleCoils.as_u8())?;
        w.write_u16(self.start_address)?;
        w.write_u16(quantity)?;
        w.write_u8(byte_count as u8)?;

        let mut packed = [0u8; 246];
        bits::pack(self.values, &mut packed[..byte_count]);
        w.write_all(&packed[..byte_count])
    }

    /// The server echoes only the address and quantity, not the coil data.
    pub fn decode_response(&self, pdu: &[u8]) -> Result<(), DecodeError> {
        let quantity = self.quantity().map_err(|_| DecodeError::EchoMismatch)?;
        let mut r = begin_decode(FunctionCode::WriteMultipleCoils, pdu)?;
        decode_echo_body(&mut r, &self.echo(quantity))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteMultipleRegisters<'a> {
    pub start_address: u16,
    pub values: &'a [u16],
}

impl<'a> WriteMultipleRegisters<'a> {
    pub fn quantity(&self) -> Result<u16, EncodeError> {
        let quantity = u16::try_from(self.values.len()).unwrap_or(u16::MAX);
        validate_quantity(quantity, MAX_WRITE_REGISTERS)?;
        Ok(quantity)
    }

    fn echo(&self, quantity: u16) -> [u8; 4] {
        let [addr_hi, addr_lo] = self.start_address.to_be_bytes();
        let [qty_hi, qty_lo] = quantity.to_be_bytes();
        [addr_hi, addr_lo, qty_hi, qty_lo]
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let quantity = self.quantity()?;

        w.write_u8(FunctionCode::WriteMultipleRegisters.as_u8())?;
        w.write_u16(self.start_address)?;
        w.write_u16(quantity)?;
        w.write_u8((self.values.len() * 2) as u8)?;
        for value in self.values {
            w.write_u16(*value)?;
        }
        Ok(())
    }

    /// The server echoes only the address and quantity, not the data.
    pub fn decode_response(&self, pdu: &[u8]) -> Result<(), DecodeError> {
        let quantity = self.quantity().map_err(|_| DecodeError::EchoMismatch)?;
        let mut r = begin_decode(FunctionCode::WriteMultipleRegisters, pdu)?;
        decode_echo_body(&mut r, &self.echo(quantity))
    }
}
