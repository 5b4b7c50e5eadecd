pub const READ_HOLDING_REGISTERS: u8 = 0x03;
pub const WRITE_SINGLE_REGISTER: u8 = 0x06;

/// Set on the function byte of an exception reply.
pub const EXCEPTION_FLAG: u8 = 0x80;

/// Slave address + function + byte count + CRC.
pub const READ_RESPONSE_OVERHEAD: usize = 5;
pub const WRITE_RESPONSE_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionRequest {
    ReadHoldingRegisters { start: u16, quantity: u16 },
    WriteSingleRegister { address: u16, value: u16 },
}

impl TransactionRequest {
    pub fn function_code(&self) -> u8 {
        match self {
            TransactionRequest::ReadHoldingRegisters { .. } => READ_HOLDING_REGISTERS,
            TransactionRequest::WriteSingleRegister { .. } => WRITE_SINGLE_REGISTER,
        }
    }

    /// Exact reply length the master waits for.
    pub fn expected_response_len(&self) -> usize {
        match self {
            TransactionRequest::ReadHoldingRegisters { quantity, .. } => {
                READ_RESPONSE_OVERHEAD + 2 * *quantity as usize
            }
            TransactionRequest::WriteSingleRegister { .. } => WRITE_RESPONSE_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionResponse {
    Registers(Vec<u16>),
    /// Address and value of the request; the echo is not compared.
    WriteConfirmed { address: u16, value: u16 },
}

impl TransactionResponse {
    pub fn into_registers(self) -> Option<Vec<u16>> {
        match self {
            TransactionResponse::Registers(values) => Some(values),
            TransactionResponse::WriteConfirmed { .. } => None,
        }
    }
}

/// Progress of one exchange. Strictly linear, one exchange at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionPhase {
    Idle,
    Sent,
    AwaitingResponse,
    Decoded,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_response_len() {
        let read = TransactionRequest::ReadHoldingRegisters { start: 0x2000, quantity: 2 };
        let write = TransactionRequest::WriteSingleRegister { address: 0x2001, value: 250 };

        assert_eq!(read.expected_response_len(), 9);
        assert_eq!(write.expected_response_len(), 8);
        assert_eq!(read.function_code(), 0x03);
        assert_eq!(write.function_code(), 0x06);
    }
}
