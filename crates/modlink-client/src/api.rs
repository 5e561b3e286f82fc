//! Typed Modbus operations, generic over any [`Client`].
//!
//! Each function validates its arguments, encodes the request PDU, runs
//! one transaction and decodes the response against the request. Server
//! exception responses surface as [`Error::Exception`].

use modlink_core::encoding::Writer;
use modlink_core::frame::MAX_PDU_LEN;
use modlink_core::pdu::{
    ReadCoils, ReadDiscreteInputs, ReadHoldingRegisters, ReadInputRegisters, WriteMultipleCoils,
    WriteMultipleRegisters, WriteSingleCoil, WriteSingleRegister,
};
use modlink_core::EncodeError;

use crate::{Client, Error};

fn encode_pdu(f: impl FnOnce(&mut Writer<'_>) -> Result<(), EncodeError>) -> Result<Vec<u8>, Error> {
    let mut buf = [0u8; MAX_PDU_LEN];
    let mut w = Writer::new(&mut buf);
    f(&mut w)?;
    Ok(w.as_written().to_vec())
}

/// Reads `quantity` coils (1..=2000) starting at `start_address`.
pub fn read_coils<C: Client>(
    client: &mut C,
    slave_id: u8,
    start_address: u16,
    quantity: u16,
) -> Result<Vec<bool>, Error> {
    let request = ReadCoils {
        start_address,
        quantity,
    };
    let pdu = encode_pdu(|w| request.encode(w))?;
    let response = client.send_receive(slave_id, &pdu)?;
    request.decode_response(&response).map_err(Error::from)
}

/// Reads `quantity` discrete inputs (1..=2000) starting at `start_address`.
pub fn read_discrete_inputs<C: Client>(
    client: &mut C,
    slave_id: u8,
    start_address: u16,
    quantity: u16,
) -> Result<Vec<bool>, Error> {
    let request = ReadDiscreteInputs {
        start_address,
        quantity,
    };
    let pdu = encode_pdu(|w| request.encode(w))?;
    let response = client.send_receive(slave_id, &pdu)?;
    request.decode_response(&response).map_err(Error::from)
}

/// Reads `quantity` holding registers (1..=125) starting at `start_address`.
pub fn read_holding_registers<C: Client>(
    client: &mut C,
    slave_id: u8,
    start_address: u16,
    quantity: u16,
) -> Result<Vec<u16>, Error> {
    let request = ReadHoldingRegisters {
        start_address,
        quantity,
    };
    let pdu = encode_pdu(|w| request.encode(w))?;
    let response = client.send_receive(slave_id, &pdu)?;
    request.decode_response(&response).map_err(Error::from)
}

/// Reads `quantity` input registers (1..=125) starting at `start_address`.
pub fn read_input_registers<C: Client>(
    client: &mut C,
    slave_id: u8,
    start_address: u16,
    quantity: u16,
) -> Result<Vec<u16>, Error> {
    let request = ReadInputRegisters {
        start_address,
        quantity,
    };
    let pdu = encode_pdu(|w| request.encode(w))?;
    let response = client.send_receive(slave_id, &pdu)?;
    request.decode_response(&response).map_err(Error::from)
}

/// Sets a single coil on or off.
pub fn write_single_coil<C: Client>(
    client: &mut C,
    slave_id: u8,
    address: u16,
    value: bool,
) -> Result<(), Error> {
    let request = WriteSingleCoil { address, value };
    let pdu = encode_pdu(|w| request.encode(w))?;
    let response = client.send_receive(slave_id, &pdu)?;
    request.decode_response(&response).map_err(Error::from)
}

/// Writes a single holding register.
pub fn write_single_register<C: Client>(
    client: &mut C,
    slave_id: u8,
    address: u16,
    value: u16,
) -> Result<(), Error> {
    let request = WriteSingleRegister { address, value };
    let pdu = encode_pdu(|w| request.encode(w))?;
    let response = client.send_receive(slave_id, &pdu)?;
    request.decode_response(&response).map_err(Error::from)
}

/// Writes a run of coils (1..=1968 values) starting at `start_address`.
pub fn write_multiple_coils<C: Client>(
    client: &mut C,
    slave_id: u8,
    start_address: u16,
    values: &[bool],
) -> Result<(), Error> {
    let request = WriteMultipleCoils {
        start_address,
        values,
    };
    let pdu = encode_pdu(|w| request.encode(w))?;
    let response = client.send_receive(slave_id, &pdu)?;
    request.decode_response(&response).map_err(Error::from)
}

/// Writes a run of holding registers (1..=123 values) starting at
/// `start_address`.
pub fn write_multiple_registers<C: Client>(
    client: &mut C,
    slave_id: u8,
    start_address: u16,
    values: &[u16],
) -> Result<(), Error> {
    let request = WriteMultipleRegisters {
        start_address,
        values,
    };
    let pdu = encode_pdu(|w| request.encode(w))?;
    let response = client.send_receive(slave_id, &pdu)?;
    request.decode_response(&response).map_err(Error::from)
}
