pub mod drive;

pub use drive::{
    DriveCommand, ModeReading, OperatingMode, RegisterSnapshot, FREQUENCY_REGISTER, MODE_REGISTER,
};
