use log::{debug, warn};
use std::thread;
use std::time::Duration;

use super::frame::{decode_read_response, decode_write_response, encode_request};
use super::protocol::{TransactionPhase, TransactionRequest, TransactionResponse};
use super::transport::SerialTransport;
use crate::config::settings::Config;
use crate::utils::error::ModbusError;

/// Bus timing for one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Pause between the end of the request and the first read.
    pub turnaround_delay: Duration,
    /// How long the reply may take to arrive in full.
    pub response_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            turnaround_delay: Duration::from_millis(50),
            response_timeout: Duration::from_millis(1000),
        }
    }
}

impl From<&Config> for Timing {
    fn from(config: &Config) -> Self {
        Self {
            turnaround_delay: config.turnaround_delay(),
            response_timeout: config.response_timeout(),
        }
    }
}

/// Modbus RTU master bound to one slave on one exclusively owned link.
///
/// Executes exactly one request/response exchange per call, with no retry.
pub struct ModbusMaster<T: SerialTransport> {
    transport: T,
    slave: u8,
    timing: Timing,
    phase: TransactionPhase,
}

impl<T: SerialTransport> ModbusMaster<T> {
    pub fn new(transport: T, slave: u8, timing: Timing) -> Self {
        Self {
            transport,
            slave,
            timing,
            phase: TransactionPhase::Idle,
        }
    }

    pub fn slave(&self) -> u8 {
        self.slave
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Where the last exchange ended up.
    pub fn phase(&self) -> TransactionPhase {
        self.phase
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn execute(&mut self, request: TransactionRequest) -> Result<TransactionResponse, ModbusError> {
        self.phase = TransactionPhase::Idle;
        let result = self.exchange(&request);
        self.phase = match result {
            Ok(_) => TransactionPhase::Decoded,
            Err(ref e) => {
                warn!("⚠️  {:?} to slave {} failed: {}", request, self.slave, e);
                TransactionPhase::Failed
            }
        };
        result
    }

    pub fn read_holding_registers(&mut self, start: u16, quantity: u16) -> Result<Vec<u16>, ModbusError> {
        let response = self.execute(TransactionRequest::ReadHoldingRegisters { start, quantity })?;
        response.into_registers().ok_or_else(|| {
            ModbusError::CommunicationError("read request produced a write confirmation".to_string())
        })
    }

    pub fn write_single_register(&mut self, address: u16, value: u16) -> Result<(), ModbusError> {
        self.execute(TransactionRequest::WriteSingleRegister { address, value })
            .map(|_| ())
    }

    fn exchange(&mut self, request: &TransactionRequest) -> Result<TransactionResponse, ModbusError> {
        let frame = encode_request(self.slave, request);
        debug!("📤 Request frame: {}", hex::encode(&frame));

        self.transport.write(&frame)?;
        self.phase = TransactionPhase::Sent;

        thread::sleep(self.timing.turnaround_delay);
        self.phase = TransactionPhase::AwaitingResponse;

        let expected_len = request.expected_response_len();
        let response = self
            .transport
            .read_up_to(expected_len, self.timing.response_timeout)?;
        debug!("📥 Response frame: {} ({} bytes)", hex::encode(&response), response.len());

        // A short read counts as no answer at all.
        if response.len() < expected_len {
            return Err(ModbusError::Timeout {
                expected: expected_len,
                received: response.len(),
            });
        }

        match *request {
            TransactionRequest::ReadHoldingRegisters { quantity, .. } => {
                decode_read_response(&response, quantity).map(TransactionResponse::Registers)
            }
            TransactionRequest::WriteSingleRegister { address, value } => {
                decode_write_response(&response)
                    .map(|_| TransactionResponse::WriteConfirmed { address, value })
            }
        }
    }
}
