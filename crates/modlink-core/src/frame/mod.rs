//! ADU framing: RTU (address + CRC trailer) and TCP (MBAP header).

pub mod rtu;
pub mod tcp;

/// Largest ADU a serial line may carry.
pub const MAX_ADU_LEN: usize = 256;

/// Largest PDU either framing may carry: 256 minus address and CRC.
pub const MAX_PDU_LEN: usize = 253;
