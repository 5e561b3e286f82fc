//! The function-code-led payload shared by both framings.

pub mod bits;
pub mod exception;
mod function;
mod request;

pub use exception::{ExceptionCode, EXCEPTION_BIT};
pub use function::FunctionCode;
pub use request::{
    ReadCoils, ReadDiscreteInputs, ReadHoldingRegisters, ReadInputRegisters, WriteMultipleCoils,
    WriteMultipleRegisters, WriteSingleCoil, WriteSingleRegister, MAX_READ_BITS,
    MAX_READ_REGISTERS, MAX_WRITE_COILS, MAX_WRITE_REGISTERS,
};
