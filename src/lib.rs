//! Modbus RTU gateway for a single drive
//!
//! Lets an operator read and change the run mode and frequency setpoint of a
//! drive that sits on a half-duplex serial link. Every session writes the
//! requested values and then reads the device back, so the reported state
//! always comes from the device itself.

pub mod cli;
pub mod config;
pub mod devices;
pub mod modbus;
pub mod output;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use devices::{DriveCommand, ModeReading, OperatingMode, RegisterSnapshot};
pub use modbus::{ModbusMaster, SerialPortTransport, SerialTransport, TransactionRequest, TransactionResponse};
pub use output::{ConsoleFormatter, HtmlFormFormatter, JsonFormatter, SnapshotFormatter};
pub use services::Reconciler;
pub use utils::error::ModbusError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
