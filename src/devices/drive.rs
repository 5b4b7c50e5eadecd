use serde::Serialize;
use std::fmt;
use std::num::IntErrorKind;

use crate::utils::error::ModbusError;

pub const MODE_REGISTER: u16 = 0x2000;
pub const FREQUENCY_REGISTER: u16 = 0x2001;

pub const MIN_FREQUENCY_HZ: i64 = 0;
pub const MAX_FREQUENCY_HZ: i64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatingMode {
    Stop,
    Run,
    Reverse,
    Forward,
}

/// Name and register value of every mode; used in both directions.
static MODE_TABLE: [(OperatingMode, &str, u16); 4] = [
    (OperatingMode::Stop, "stop", 1),
    (OperatingMode::Run, "run", 2),
    (OperatingMode::Reverse, "reverse", 4),
    (OperatingMode::Forward, "forward", 8),
];

impl OperatingMode {
    pub const ALL: [OperatingMode; 4] = [
        OperatingMode::Stop,
        OperatingMode::Run,
        OperatingMode::Reverse,
        OperatingMode::Forward,
    ];

    fn entry(self) -> &'static (OperatingMode, &'static str, u16) {
        // Every variant has exactly one row.
        MODE_TABLE
            .iter()
            .find(|(mode, _, _)| *mode == self)
            .unwrap_or(&MODE_TABLE[0])
    }

    pub fn name(self) -> &'static str {
        self.entry().1
    }

    pub fn register_value(self) -> u16 {
        self.entry().2
    }

    /// Anything that is not a known mode name selects `Stop`.
    pub fn from_name(name: &str) -> Self {
        MODE_TABLE
            .iter()
            .find(|(_, mode_name, _)| *mode_name == name)
            .map(|(mode, _, _)| *mode)
            .unwrap_or(OperatingMode::Stop)
    }

    pub fn from_register(value: u16) -> Option<Self> {
        MODE_TABLE
            .iter()
            .find(|(_, _, raw)| *raw == value)
            .map(|(mode, _, _)| *mode)
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mode as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeReading {
    Known(OperatingMode),
    /// Register value with no mode name.
    Unknown(u16),
}

impl ModeReading {
    pub fn from_register(value: u16) -> Self {
        OperatingMode::from_register(value)
            .map(ModeReading::Known)
            .unwrap_or(ModeReading::Unknown(value))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModeReading::Known(mode) => mode.name(),
            ModeReading::Unknown(_) => "unknown",
        }
    }

    pub fn raw(&self) -> u16 {
        match self {
            ModeReading::Known(mode) => mode.register_value(),
            ModeReading::Unknown(value) => *value,
        }
    }

    pub fn is(&self, mode: OperatingMode) -> bool {
        *self == ModeReading::Known(mode)
    }
}

/// Device state after a session, always taken from a fresh read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSnapshot {
    pub mode: ModeReading,
    pub frequency: u16,
}

impl RegisterSnapshot {
    /// Shown when the read-back fails.
    pub const DEFAULT: RegisterSnapshot = RegisterSnapshot {
        mode: ModeReading::Known(OperatingMode::Stop),
        frequency: 0,
    };

    /// Build from the mode and frequency registers, in that order.
    pub fn from_registers(registers: &[u16]) -> Option<Self> {
        match registers {
            [mode, frequency, ..] => Some(Self {
                mode: ModeReading::from_register(*mode),
                frequency: *frequency,
            }),
            _ => None,
        }
    }

    pub fn view(&self) -> SnapshotView {
        SnapshotView {
            mode: self.mode.name(),
            raw_mode: self.mode.raw(),
            frequency: self.frequency,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotView {
    pub mode: &'static str,
    pub raw_mode: u16,
    pub frequency: u16,
}

/// Decoded operator request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveCommand {
    pub mode: OperatingMode,
    /// As entered; only 0..=500 is written.
    pub frequency: i64,
}

impl DriveCommand {
    pub fn new(mode: OperatingMode, frequency: i64) -> Self {
        Self { mode, frequency }
    }

    /// Decode the raw form fields. A missing mode is `stop`, a missing frequency `0`.
    pub fn from_form(mode: Option<&str>, frequency: Option<&str>) -> Result<Self, ModbusError> {
        let mode = OperatingMode::from_name(mode.unwrap_or("stop"));
        let frequency = match frequency.map(str::trim) {
            None => 0,
            Some(text) => parse_frequency(text)?,
        };
        Ok(Self { mode, frequency })
    }

    /// Frequency to write, if it is inside the accepted range.
    pub fn frequency_setpoint(&self) -> Option<u16> {
        if (MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&self.frequency) {
            Some(self.frequency as u16)
        } else {
            None
        }
    }
}

/// Integers beyond `i64` saturate, so they stay out of range instead of failing.
fn parse_frequency(text: &str) -> Result<i64, ModbusError> {
    text.parse::<i64>().or_else(|e| match e.kind() {
        IntErrorKind::PosOverflow => Ok(i64::MAX),
        IntErrorKind::NegOverflow => Ok(i64::MIN),
        _ => Err(ModbusError::InvalidCommand(format!(
            "frequency '{}' is not an integer",
            text
        ))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_mapping_is_bijective() {
        let expected = [(1, "stop"), (2, "run"), (4, "reverse"), (8, "forward")];
        for (raw, name) in expected {
            let mode = OperatingMode::from_register(raw).unwrap();
            assert_eq!(mode.name(), name);
            assert_eq!(mode.register_value(), raw);
            assert_eq!(OperatingMode::from_name(name), mode);
            assert_eq!(ModeReading::from_register(raw).name(), name);
        }
    }

    #[test]
    fn test_unmapped_values_decode_to_unknown() {
        for raw in [0u16, 3, 16, 0xFFFF] {
            let reading = ModeReading::from_register(raw);
            assert_eq!(reading, ModeReading::Unknown(raw));
            assert_eq!(reading.name(), "unknown");
            assert!(OperatingMode::ALL.iter().all(|mode| !reading.is(*mode)));
        }
    }

    #[test]
    fn test_unknown_mode_name_defaults_to_stop() {
        assert_eq!(OperatingMode::from_name("sideways"), OperatingMode::Stop);
        assert_eq!(OperatingMode::from_name("RUN"), OperatingMode::Stop);
        assert_eq!(OperatingMode::from_name(""), OperatingMode::Stop);
    }

    #[test]
    fn test_command_from_form() {
        let command = DriveCommand::from_form(Some("reverse"), Some(" 120 ")).unwrap();
        assert_eq!(command, DriveCommand::new(OperatingMode::Reverse, 120));

        let command = DriveCommand::from_form(None, None).unwrap();
        assert_eq!(command, DriveCommand::new(OperatingMode::Stop, 0));

        let command = DriveCommand::from_form(Some("forward"), Some("-1")).unwrap();
        assert_eq!(command.frequency_setpoint(), None);
    }

    #[test]
    fn test_non_numeric_frequency_is_rejected() {
        let err = DriveCommand::from_form(Some("run"), Some("fast")).unwrap_err();
        assert!(err.is_caller_violation());
        assert!(DriveCommand::from_form(Some("run"), Some("")).is_err());
        assert!(DriveCommand::from_form(Some("run"), Some("12.5")).is_err());
    }

    #[test]
    fn test_oversized_frequency_is_out_of_range() {
        let command = DriveCommand::from_form(Some("run"), Some("99999999999999999999")).unwrap();
        assert_eq!(command.mode, OperatingMode::Run);
        assert_eq!(command.frequency, i64::MAX);
        assert_eq!(command.frequency_setpoint(), None);

        let command = DriveCommand::from_form(Some("run"), Some("-99999999999999999999")).unwrap();
        assert_eq!(command.frequency, i64::MIN);
        assert_eq!(command.frequency_setpoint(), None);
    }

    #[test]
    fn test_padded_mode_name_is_not_recognised() {
        let command = DriveCommand::from_form(Some(" run"), Some("10")).unwrap();
        assert_eq!(command.mode, OperatingMode::Stop);
        let command = DriveCommand::from_form(Some("run "), None).unwrap();
        assert_eq!(command.mode, OperatingMode::Stop);
    }

    #[test]
    fn test_frequency_bounds() {
        assert_eq!(DriveCommand::new(OperatingMode::Run, 0).frequency_setpoint(), Some(0));
        assert_eq!(DriveCommand::new(OperatingMode::Run, 500).frequency_setpoint(), Some(500));
        assert_eq!(DriveCommand::new(OperatingMode::Run, 501).frequency_setpoint(), None);
        assert_eq!(DriveCommand::new(OperatingMode::Run, -1).frequency_setpoint(), None);
    }

    #[test]
    fn test_snapshot_from_registers() {
        let snapshot = RegisterSnapshot::from_registers(&[8, 42]).unwrap();
        assert!(snapshot.mode.is(OperatingMode::Forward));
        assert_eq!(snapshot.frequency, 42);
        assert_eq!(RegisterSnapshot::from_registers(&[8]), None);

        let view = RegisterSnapshot::from_registers(&[16, 7]).unwrap().view();
        assert_eq!(view.mode, "unknown");
        assert_eq!(view.raw_mode, 16);
    }
}
