use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModbusError {
    #[error("Timeout: expected {expected} bytes, received {received}")]
    Timeout { expected: usize, received: usize },

    #[error("CRC checksum mismatch: frame carries 0x{received:04X}, computed 0x{expected:04X}")]
    CrcMismatch { expected: u16, received: u16 },

    #[error("Unexpected byte count: expected {expected}, device reported {actual}")]
    UnexpectedByteCount { expected: usize, actual: usize },

    #[error("Device answered function 0x{function:02X} with exception code 0x{code:02X}")]
    ExceptionResponse { function: u8, code: u8 },

    #[error("Unexpected function code: expected 0x{expected:02X}, got 0x{actual:02X}")]
    UnexpectedFunction { expected: u8, actual: u8 },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Communication error: {0}")]
    CommunicationError(String),

    #[error("Lock acquisition failed")]
    LockError,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ModbusError {
    /// Failures that belong to a single request/response exchange on the bus.
    pub fn is_transaction_failure(&self) -> bool {
        matches!(
            self,
            ModbusError::Timeout { .. }
                | ModbusError::CrcMismatch { .. }
                | ModbusError::UnexpectedByteCount { .. }
                | ModbusError::ExceptionResponse { .. }
                | ModbusError::UnexpectedFunction { .. }
                | ModbusError::CommunicationError(_)
        )
    }

    pub fn is_caller_violation(&self) -> bool {
        matches!(self, ModbusError::InvalidCommand(_))
    }
}

impl From<serde_json::Error> for ModbusError {
    fn from(err: serde_json::Error) -> Self {
        ModbusError::SerializationError(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for ModbusError {
    fn from(err: std::io::Error) -> Self {
        ModbusError::CommunicationError(format!("IO error: {}", err))
    }
}

impl From<serialport::Error> for ModbusError {
    fn from(err: serialport::Error) -> Self {
        ModbusError::ConnectionError(format!("Serial port error: {}", err))
    }
}

impl From<toml::de::Error> for ModbusError {
    fn from(err: toml::de::Error) -> Self {
        ModbusError::ConfigError(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for ModbusError {
    fn from(err: toml::ser::Error) -> Self {
        ModbusError::SerializationError(format!("TOML error: {}", err))
    }
}
