use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex};

use crate::devices::drive::{DriveCommand, RegisterSnapshot, FREQUENCY_REGISTER, MODE_REGISTER};
use crate::modbus::{ModbusMaster, SerialTransport};
use crate::utils::error::ModbusError;

/// Mode and frequency are read back together.
const SNAPSHOT_REGISTER_COUNT: u16 = 2;

/// Concurrent sessions take turns on one reconciler, and therefore on one link.
pub type SharedReconciler<T> = Arc<Mutex<Reconciler<T>>>;

/// Snapshot reported when the read-back fails: stopped, at zero frequency.
///
/// No retry is made and no error reaches the operator.
pub fn snapshot_on_read_failure(err: &ModbusError) -> RegisterSnapshot {
    if err.is_transaction_failure() {
        warn!("⚠️  Read-back failed, reporting default state: {}", err);
    } else {
        error!("❌ Read-back could not run, reporting default state: {}", err);
    }
    RegisterSnapshot::DEFAULT
}

/// Applies an operator command to the drive and reads back its actual state.
pub struct Reconciler<T: SerialTransport> {
    master: ModbusMaster<T>,
}

impl<T: SerialTransport> Reconciler<T> {
    pub fn new(master: ModbusMaster<T>) -> Self {
        let timing = master.timing();
        info!(
            "🔧 Reconciling slave {} (turnaround {:?}, response window {:?})",
            master.slave(),
            timing.turnaround_delay,
            timing.response_timeout
        );
        Self { master }
    }

    pub fn into_shared(self) -> SharedReconciler<T> {
        Arc::new(Mutex::new(self))
    }

    pub fn master(&self) -> &ModbusMaster<T> {
        &self.master
    }

    /// One session: optional writes, then an unconditional read-back.
    pub fn reconcile(&mut self, command: Option<&DriveCommand>) -> RegisterSnapshot {
        if let Some(command) = command {
            self.apply(command);
        }

        match self.read_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => snapshot_on_read_failure(&e),
        }
    }

    /// Read mode and frequency straight from the device.
    pub fn read_snapshot(&mut self) -> Result<RegisterSnapshot, ModbusError> {
        let registers = self
            .master
            .read_holding_registers(MODE_REGISTER, SNAPSHOT_REGISTER_COUNT)?;
        let snapshot = RegisterSnapshot::from_registers(&registers).ok_or(
            ModbusError::UnexpectedByteCount {
                expected: 2 * SNAPSHOT_REGISTER_COUNT as usize,
                actual: 2 * registers.len(),
            },
        )?;
        debug!("📊 Device reports mode={} frequency={}", snapshot.mode.name(), snapshot.frequency);
        Ok(snapshot)
    }

    // Write outcomes do not change the session result; the read-back decides.
    fn apply(&mut self, command: &DriveCommand) {
        info!("📝 Applying mode '{}' and frequency {}", command.mode, command.frequency);

        if let Err(e) = self
            .master
            .write_single_register(MODE_REGISTER, command.mode.register_value())
        {
            warn!("⚠️  Mode write failed: {}", e);
        }

        match command.frequency_setpoint() {
            Some(hz) => {
                if let Err(e) = self.master.write_single_register(FREQUENCY_REGISTER, hz) {
                    warn!("⚠️  Frequency write failed: {}", e);
                }
            }
            None => debug!("Frequency {} out of range, not written", command.frequency),
        }
    }
}

/// Run a session on a shared reconciler, holding the link for all of it.
pub fn reconcile_shared<T: SerialTransport>(
    shared: &SharedReconciler<T>,
    command: Option<&DriveCommand>,
) -> Result<RegisterSnapshot, ModbusError> {
    let mut reconciler = shared.lock().map_err(|_| ModbusError::LockError)?;
    Ok(reconciler.reconcile(command))
}
