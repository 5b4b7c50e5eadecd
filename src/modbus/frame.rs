//! RTU frame layout for the two supported function codes.
//!
//! Every 16-bit field is big-endian; the trailing CRC is little-endian.

use super::crc::{append_crc, crc16_modbus, trailing_crc};
use super::protocol::{
    TransactionRequest, EXCEPTION_FLAG, READ_HOLDING_REGISTERS, READ_RESPONSE_OVERHEAD,
    WRITE_RESPONSE_LEN, WRITE_SINGLE_REGISTER,
};
use crate::utils::error::ModbusError;

pub fn encode_read(slave: u8, start_addr: u16, quantity: u16) -> Vec<u8> {
    let mut frame = Vec::with_capacity(8);
    frame.push(slave);
    frame.push(READ_HOLDING_REGISTERS);
    frame.extend_from_slice(&start_addr.to_be_bytes());
    frame.extend_from_slice(&quantity.to_be_bytes());
    append_crc(&mut frame);
    frame
}

pub fn encode_write(slave: u8, reg_addr: u16, value: u16) -> Vec<u8> {
    let mut frame = Vec::with_capacity(8);
    frame.push(slave);
    frame.push(WRITE_SINGLE_REGISTER);
    frame.extend_from_slice(&reg_addr.to_be_bytes());
    frame.extend_from_slice(&value.to_be_bytes());
    append_crc(&mut frame);
    frame
}

pub fn encode_request(slave: u8, request: &TransactionRequest) -> Vec<u8> {
    match *request {
        TransactionRequest::ReadHoldingRegisters { start, quantity } => {
            encode_read(slave, start, quantity)
        }
        TransactionRequest::WriteSingleRegister { address, value } => {
            encode_write(slave, address, value)
        }
    }
}

fn verify_crc(raw: &[u8]) -> Result<(), ModbusError> {
    let received = trailing_crc(raw).ok_or(ModbusError::Timeout {
        expected: 2,
        received: raw.len(),
    })?;
    let expected = crc16_modbus(&raw[..raw.len() - 2]);
    if received != expected {
        return Err(ModbusError::CrcMismatch { expected, received });
    }
    Ok(())
}

/// Decode a read-holding-registers reply carrying `expected_quantity` registers.
///
/// The caller has already collected `5 + 2 * expected_quantity` bytes.
pub fn decode_read_response(raw: &[u8], expected_quantity: u16) -> Result<Vec<u16>, ModbusError> {
    let expected_len = READ_RESPONSE_OVERHEAD + 2 * expected_quantity as usize;
    if raw.len() < READ_RESPONSE_OVERHEAD {
        return Err(ModbusError::Timeout {
            expected: expected_len,
            received: raw.len(),
        });
    }

    verify_crc(raw)?;

    let function = raw[1];
    if function == READ_HOLDING_REGISTERS | EXCEPTION_FLAG {
        return Err(ModbusError::ExceptionResponse {
            function: READ_HOLDING_REGISTERS,
            code: raw[2],
        });
    }
    if function != READ_HOLDING_REGISTERS {
        return Err(ModbusError::UnexpectedFunction {
            expected: READ_HOLDING_REGISTERS,
            actual: function,
        });
    }

    let byte_count = raw[2] as usize;
    let data_len = raw.len() - READ_RESPONSE_OVERHEAD;
    if byte_count != 2 * expected_quantity as usize || byte_count != data_len {
        return Err(ModbusError::UnexpectedByteCount {
            expected: 2 * expected_quantity as usize,
            actual: byte_count,
        });
    }

    Ok(raw[3..3 + byte_count]
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}

/// Accept a write-single-register echo on length and CRC alone.
///
/// The echoed address and value are not compared with the request.
pub fn decode_write_response(raw: &[u8]) -> Result<(), ModbusError> {
    if raw.len() != WRITE_RESPONSE_LEN {
        return Err(ModbusError::Timeout {
            expected: WRITE_RESPONSE_LEN,
            received: raw.len(),
        });
    }
    verify_crc(raw)
}
