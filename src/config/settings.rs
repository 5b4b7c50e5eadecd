use clap::ArgMatches;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::utils::error::ModbusError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Connection settings
    pub serial_port: String,
    pub baud_rate: u32,
    pub parity: ParityConfig,

    // Bus settings
    pub slave_address: u8,
    pub timeout_ms: u64,
    pub turnaround_delay_ms: u64,

    // Front-end settings
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParityConfig {
    None,
    Even,
    Odd,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 80,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let serial_port = if cfg!(target_os = "windows") {
            "COM1"
        } else if cfg!(target_os = "macos") {
            "/dev/tty.usbserial-0001"
        } else {
            "/dev/ttyUSB0"
        };

        Self {
            serial_port: serial_port.to_string(),
            baud_rate: 9600,
            parity: ParityConfig::None,
            slave_address: 1,
            timeout_ms: 1000,
            turnaround_delay_ms: 50,
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModbusError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ModbusError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        info!("📋 Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ModbusError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override file or default values with whatever was given on the command line.
    pub fn apply_matches(&mut self, matches: &ArgMatches) -> Result<(), ModbusError> {
        if let Some(port) = arg_value(matches, "port") {
            self.serial_port = port.clone();
        }
        if let Some(baud) = arg_value(matches, "baud") {
            self.baud_rate = parse_arg("baud", baud)?;
        }
        if let Some(slave) = arg_value(matches, "slave") {
            self.slave_address = parse_arg("slave", slave)?;
        }
        if let Some(timeout) = arg_value(matches, "timeout-ms") {
            self.timeout_ms = parse_arg("timeout-ms", timeout)?;
        }
        if let Some(delay) = arg_value(matches, "turnaround-ms") {
            self.turnaround_delay_ms = parse_arg("turnaround-ms", delay)?;
        }
        debug!("Effective configuration: {:?}", self);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ModbusError> {
        if !(1..=247).contains(&self.slave_address) {
            return Err(ModbusError::ConfigError(format!(
                "slave address {} outside 1..=247",
                self.slave_address
            )));
        }
        if self.baud_rate == 0 {
            return Err(ModbusError::ConfigError("baud rate must be positive".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ModbusError::ConfigError("response timeout must be positive".to_string()));
        }
        if self.serial_port.trim().is_empty() {
            return Err(ModbusError::ConfigError("serial port is not set".to_string()));
        }
        Ok(())
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn turnaround_delay(&self) -> Duration {
        Duration::from_millis(self.turnaround_delay_ms)
    }

    pub fn http_address(&self) -> String {
        format!("{}:{}", self.http.bind_address, self.http.port)
    }
}

/// Value of an option, or `None` when it was not given or not defined.
fn arg_value<'a>(matches: &'a ArgMatches, id: &str) -> Option<&'a String> {
    matches.try_get_one::<String>(id).ok().flatten()
}

fn parse_arg<V: std::str::FromStr>(name: &str, value: &str) -> Result<V, ModbusError> {
    value
        .parse()
        .map_err(|_| ModbusError::ConfigError(format!("invalid value '{}' for --{}", value, name)))
}
