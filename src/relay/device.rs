//! Output device abstraction.
//!
//! # Responsibilities
//! - Drive one binary output (the relay pin)
//! - Release the underlying handle on shutdown
//!
//! # Design Decisions
//! - Writes are idempotent: writing the current state again is harmless
//! - Failures are returned, never retried here
//! - Hardware (sysfs) and in-memory variants share one trait so the
//!   controller can be exercised without a board attached

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::config::{RelayConfig, RelayDriver};
use crate::relay::RelayState;

/// Errors raised by an output device.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Reading or writing a device attribute failed.
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The device handle was already released during shutdown.
    #[error("output device has already been released")]
    Released,

    /// Fault reported by the device itself.
    #[error("output device fault: {0}")]
    Fault(String),
}

/// A binary actuator.
pub trait OutputDevice: Send {
    /// Drive the output to `state`.
    fn write(&mut self, state: RelayState) -> Result<(), DeviceError>;

    /// Give the handle back to the system. Called at most once.
    fn release(&mut self) -> Result<(), DeviceError>;

    /// Short human-readable identifier for logs.
    fn describe(&self) -> String;
}

/// Open the device selected by configuration.
pub fn open_device(config: &RelayConfig) -> Result<Box<dyn OutputDevice>, DeviceError> {
    match config.driver {
        RelayDriver::Sysfs => Ok(Box::new(SysfsGpio::open(&config.sysfs_root, config.pin)?)),
        RelayDriver::Simulated => Ok(Box::new(SimulatedOutput::new())),
    }
}

fn write_attr(path: &Path, value: &str, action: &'static str) -> Result<(), DeviceError> {
    fs::write(path, value).map_err(|source| DeviceError::Io {
        action,
        path: path.to_path_buf(),
        source,
    })
}

/// GPIO pin driven through the Linux sysfs interface.
#[derive(Debug)]
pub struct SysfsGpio {
    root: PathBuf,
    pin: u32,
    /// Only unexport pins we exported ourselves.
    exported: bool,
}

impl SysfsGpio {
    /// Export `pin` under `root` if needed and configure it as an output
    /// that starts low.
    pub fn open(root: impl Into<PathBuf>, pin: u32) -> Result<Self, DeviceError> {
        let root = root.into();
        let pin_dir = root.join(format!("gpio{pin}"));

        let exported = if pin_dir.exists() {
            false
        } else {
            write_attr(&root.join("export"), &pin.to_string(), "export pin via")?;
            true
        };

        write_attr(&pin_dir.join("direction"), "low", "configure")?;

        tracing::info!(pin, root = %root.display(), exported, "GPIO output opened");
        Ok(Self { root, pin, exported })
    }

    fn value_path(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.pin)).join("value")
    }
}

impl OutputDevice for SysfsGpio {
    fn write(&mut self, state: RelayState) -> Result<(), DeviceError> {
        write_attr(&self.value_path(), &state.level().to_string(), "write")
    }

    fn release(&mut self) -> Result<(), DeviceError> {
        if self.exported {
            write_attr(&self.root.join("unexport"), &self.pin.to_string(), "unexport pin via")?;
            self.exported = false;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sysfs gpio{}", self.pin)
    }
}

#[derive(Debug, Default)]
struct SimulatedLog {
    writes: Vec<RelayState>,
    releases: usize,
    fault: Option<String>,
}

fn lock_log(log: &Mutex<SimulatedLog>) -> MutexGuard<'_, SimulatedLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory output used when no hardware is attached.
#[derive(Debug, Default)]
pub struct SimulatedOutput {
    log: Arc<Mutex<SimulatedLog>>,
}

impl SimulatedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for inspecting writes after the device has been moved into
    /// a controller.
    pub fn probe(&self) -> SimulatedProbe {
        SimulatedProbe {
            log: self.log.clone(),
        }
    }
}

impl OutputDevice for SimulatedOutput {
    fn write(&mut self, state: RelayState) -> Result<(), DeviceError> {
        let mut log = lock_log(&self.log);
        if let Some(reason) = &log.fault {
            return Err(DeviceError::Fault(reason.clone()));
        }
        log.writes.push(state);
        tracing::debug!(state = %state, "Simulated output written");
        Ok(())
    }

    fn release(&mut self) -> Result<(), DeviceError> {
        lock_log(&self.log).releases += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "simulated output".to_string()
    }
}

/// Observer side of a [`SimulatedOutput`].
#[derive(Debug, Clone)]
pub struct SimulatedProbe {
    log: Arc<Mutex<SimulatedLog>>,
}

impl SimulatedProbe {
    /// Every state written so far, oldest first.
    pub fn writes(&self) -> Vec<RelayState> {
        lock_log(&self.log).writes.clone()
    }

    pub fn last_write(&self) -> Option<RelayState> {
        lock_log(&self.log).writes.last().copied()
    }

    pub fn release_count(&self) -> usize {
        lock_log(&self.log).releases
    }

    /// Make every subsequent write fail with `reason` (or succeed again
    /// with `None`).
    pub fn set_fault(&self, reason: Option<&str>) {
        lock_log(&self.log).fault = reason.map(str::to_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sysfs_existing_pin_is_not_exported() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("gpio26")).unwrap();

        let mut gpio = SysfsGpio::open(root.path(), 26).unwrap();
        let direction = fs::read_to_string(root.path().join("gpio26/direction")).unwrap();
        assert_eq!(direction, "low");
        assert!(!root.path().join("export").exists());

        gpio.write(RelayState::On).unwrap();
        let value = fs::read_to_string(root.path().join("gpio26/value")).unwrap();
        assert_eq!(value, "1");

        gpio.write(RelayState::Off).unwrap();
        let value = fs::read_to_string(root.path().join("gpio26/value")).unwrap();
        assert_eq!(value, "0");

        gpio.release().unwrap();
        assert!(!root.path().join("unexport").exists());
    }

    #[test]
    fn test_sysfs_missing_pin_dir_after_export_fails() {
        // Nothing creates gpio17/ in a plain directory, so configuring
        // the direction must surface an I/O error.
        let root = tempfile::tempdir().unwrap();
        let err = SysfsGpio::open(root.path(), 17).unwrap_err();

        assert_eq!(fs::read_to_string(root.path().join("export")).unwrap(), "17");
        match err {
            DeviceError::Io { action, path, .. } => {
                assert_eq!(action, "configure");
                assert!(path.ends_with("gpio17/direction"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_simulated_records_writes_and_faults() {
        let mut device = SimulatedOutput::new();
        let probe = device.probe();

        device.write(RelayState::On).unwrap();
        device.write(RelayState::On).unwrap();
        assert_eq!(probe.writes(), vec![RelayState::On, RelayState::On]);

        probe.set_fault(Some("coil open"));
        let err = device.write(RelayState::Off).unwrap_err();
        assert!(err.to_string().contains("coil open"));
        assert_eq!(probe.last_write(), Some(RelayState::On));

        device.release().unwrap();
        assert_eq!(probe.release_count(), 1);
    }
}
