//! In-memory slave used by the unit tests in place of a serial port.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use super::crc::{append_crc, crc16_modbus, trailing_crc};
use super::protocol::{READ_HOLDING_REGISTERS, WRITE_SINGLE_REGISTER};
use super::transport::SerialTransport;
use crate::utils::error::ModbusError;

#[derive(Debug, Default)]
pub struct SimulatedSlave {
    pub address: u8,
    pub registers: HashMap<u16, u16>,
    /// Every frame the master wrote, in order.
    pub received: Vec<Vec<u8>>,
    pub silent_reads: bool,
    pub silent_writes: bool,
    pub corrupt_replies: bool,
    /// Exception code to answer read requests with.
    pub read_exception: Option<u8>,
    pending: VecDeque<u8>,
}

impl SimulatedSlave {
    pub fn new(address: u8) -> Self {
        Self { address, ..Default::default() }
    }

    pub fn with_register(mut self, address: u16, value: u16) -> Self {
        self.registers.insert(address, value);
        self
    }

    pub fn writes(&self) -> Vec<(u16, u16)> {
        self.received
            .iter()
            .filter(|frame| frame[1] == WRITE_SINGLE_REGISTER)
            .map(|frame| {
                (
                    u16::from_be_bytes([frame[2], frame[3]]),
                    u16::from_be_bytes([frame[4], frame[5]]),
                )
            })
            .collect()
    }

    fn accepts(&self, frame: &[u8]) -> bool {
        frame.len() == 8
            && frame[0] == self.address
            && trailing_crc(frame) == Some(crc16_modbus(&frame[..6]))
    }

    fn reply(&self, frame: &[u8]) -> Option<Vec<u8>> {
        if !self.accepts(frame) {
            return None;
        }

        let first = u16::from_be_bytes([frame[2], frame[3]]);
        let second = u16::from_be_bytes([frame[4], frame[5]]);

        let mut reply = match frame[1] {
            READ_HOLDING_REGISTERS if self.silent_reads => return None,
            READ_HOLDING_REGISTERS => match self.read_exception {
                Some(code) => vec![self.address, READ_HOLDING_REGISTERS | 0x80, code],
                None => {
                    let mut reply = vec![self.address, READ_HOLDING_REGISTERS, (second * 2) as u8];
                    for offset in 0..second {
                        let value = self.registers.get(&(first + offset)).copied().unwrap_or(0);
                        reply.extend_from_slice(&value.to_be_bytes());
                    }
                    reply
                }
            },
            WRITE_SINGLE_REGISTER if self.silent_writes => return None,
            WRITE_SINGLE_REGISTER => frame[..6].to_vec(),
            _ => return None,
        };
        append_crc(&mut reply);

        if self.corrupt_replies {
            let last = reply.len() - 1;
            reply[last] ^= 0xFF;
        }
        Some(reply)
    }
}

impl SerialTransport for SimulatedSlave {
    fn write(&mut self, frame: &[u8]) -> Result<(), ModbusError> {
        self.received.push(frame.to_vec());
        self.pending.clear();

        if self.accepts(frame) && frame[1] == WRITE_SINGLE_REGISTER && !self.silent_writes {
            let address = u16::from_be_bytes([frame[2], frame[3]]);
            let value = u16::from_be_bytes([frame[4], frame[5]]);
            self.registers.insert(address, value);
        }

        if let Some(reply) = self.reply(frame) {
            self.pending.extend(reply);
        }
        Ok(())
    }

    fn read_up_to(&mut self, max_len: usize, _timeout: Duration) -> Result<Vec<u8>, ModbusError> {
        let n = max_len.min(self.pending.len());
        Ok(self.pending.drain(..n).collect())
    }
}
