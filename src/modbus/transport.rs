use log::{debug, error, info};
use serialport::{ClearBuffer, SerialPort};
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use crate::config::settings::{Config, ParityConfig};
use crate::utils::error::ModbusError;

/// Longest single blocking read while collecting a reply.
const READ_SLICE: Duration = Duration::from_millis(20);

/// Hardware boundary consumed by the transaction engine.
pub trait SerialTransport: Send {
    /// Put a whole frame on the wire.
    fn write(&mut self, frame: &[u8]) -> Result<(), ModbusError>;

    /// Block until `max_len` bytes arrived or `timeout` elapsed.
    ///
    /// Returns whatever was collected, possibly fewer bytes or none.
    fn read_up_to(&mut self, max_len: usize, timeout: Duration) -> Result<Vec<u8>, ModbusError>;
}

pub struct SerialPortTransport {
    port: Box<dyn SerialPort>,
}

impl SerialPortTransport {
    pub fn open(config: &Config) -> Result<Self, ModbusError> {
        info!("🔌 Connecting to Modbus RTU port: {}", config.serial_port);
        info!(
            "⚙️  Configuration: {} baud, 8 data bits, {:?} parity, 1 stop bit",
            config.baud_rate, config.parity
        );

        let parity = match config.parity {
            ParityConfig::None => serialport::Parity::None,
            ParityConfig::Even => serialport::Parity::Even,
            ParityConfig::Odd => serialport::Parity::Odd,
        };

        let port = serialport::new(&config.serial_port, config.baud_rate)
            .timeout(READ_SLICE)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(parity)
            .open()
            .map_err(|e| {
                error!("❌ Failed to open serial port {}: {}", config.serial_port, e);
                ModbusError::ConnectionError(format!("Failed to open port: {}", e))
            })?;

        info!("✅ Modbus RTU connection established");
        Ok(Self { port })
    }
}

impl SerialTransport for SerialPortTransport {
    fn write(&mut self, frame: &[u8]) -> Result<(), ModbusError> {
        // Drop anything a previous, late reply left in the input buffer.
        self.port.clear(ClearBuffer::Input)?;

        self.port
            .write_all(frame)
            .map_err(|e| ModbusError::CommunicationError(format!("Write failed: {}", e)))?;
        self.port
            .flush()
            .map_err(|e| ModbusError::CommunicationError(format!("Flush failed: {}", e)))?;
        Ok(())
    }

    fn read_up_to(&mut self, max_len: usize, timeout: Duration) -> Result<Vec<u8>, ModbusError> {
        let mut response = Vec::with_capacity(max_len);
        let mut buffer = [0u8; 256];
        let deadline = Instant::now() + timeout;

        while response.len() < max_len {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            self.port.set_timeout((deadline - now).min(READ_SLICE))?;

            let wanted = (max_len - response.len()).min(buffer.len());
            match self.port.read(&mut buffer[..wanted]) {
                Ok(n) if n > 0 => {
                    debug!("📥 Chunk received: {} ({} bytes)", hex::encode(&buffer[..n]), n);
                    response.extend_from_slice(&buffer[..n]);
                }
                Ok(_) => {}
                Err(ref e) if e.kind() == ErrorKind::TimedOut => {}
                Err(e) => {
                    return Err(ModbusError::CommunicationError(format!("Read failed: {}", e)));
                }
            }
        }

        Ok(response)
    }
}

pub fn list_serial_ports() -> Result<Vec<String>, ModbusError> {
    let ports = serialport::available_ports()?;
    let mut lines = Vec::with_capacity(ports.len());

    for port in ports {
        let mut line = port.port_name.clone();
        if let serialport::SerialPortType::UsbPort(usb_info) = &port.port_type {
            line.push_str(&format!(" (USB {:04x}:{:04x}", usb_info.vid, usb_info.pid));
            if let Some(manufacturer) = &usb_info.manufacturer {
                line.push_str(&format!(", {}", manufacturer));
            }
            if let Some(serial_number) = &usb_info.serial_number {
                line.push_str(&format!(", S/N {}", serial_number));
            }
            line.push(')');
        }
        lines.push(line);
    }

    Ok(lines)
}
