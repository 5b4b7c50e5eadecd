pub mod client;
pub mod crc;
pub mod frame;
pub mod protocol;
pub mod transport;

#[cfg(test)]
pub(crate) mod sim;

pub use client::{ModbusMaster, Timing};
pub use crc::crc16_modbus;
pub use frame::{decode_read_response, decode_write_response, encode_read, encode_write};
pub use protocol::{TransactionPhase, TransactionRequest, TransactionResponse};
pub use transport::{list_serial_ports, SerialPortTransport, SerialTransport};
