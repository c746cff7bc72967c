//! Bring-up configuration.
//!
//! Every field has a default matching the reference board, so a config
//! file only needs the values it changes:
//!
//! ```json
//! {
//!   "cadence": "free_running",
//!   "max_handshake_attempts": 20,
//!   "serial": { "port": "/dev/ttyUSB0" }
//! }
//! ```

use crate::error::{BringupError, Result};
use rfidlock_core::constants::*;
use rfidlock_hardware::{Cadence, LinkSettings, TimeoutWindow};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Serial port selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path. `None` means no physical port is configured.
    pub port: Option<String>,

    pub baud_rate: u32,
}

impl SerialConfig {
    /// 8N1 link settings at the configured baud rate.
    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings::with_baud_rate(self.baud_rate)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Timing, capacity and link settings for a bring-up run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BringupConfig {
    /// Timeout window period in milliseconds.
    pub timeout_window_ms: u64,

    pub cadence: Cadence,

    /// Delay before retrying the handshake, and after identity.
    pub settle_delay_ms: u64,

    /// Hold time for each identity byte on the status bus.
    pub identity_hold_ms: u64,

    /// Hold time for each calibration result.
    pub calibration_hold_ms: u64,

    /// Hold time for the protocol select and tag poll results.
    pub result_hold_ms: u64,

    pub open_pulse_us: u64,
    pub close_pulse_us: u64,

    /// Maximum identity payload bytes stored.
    pub identity_capacity: usize,

    /// Give up the handshake after this many attempts. Unbounded if unset.
    pub max_handshake_attempts: Option<u32>,

    pub serial: SerialConfig,
}

impl Default for BringupConfig {
    fn default() -> Self {
        Self {
            timeout_window_ms: DEFAULT_TIMEOUT_WINDOW_MS,
            cadence: Cadence::default(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            identity_hold_ms: DEFAULT_IDENTITY_HOLD_MS,
            calibration_hold_ms: DEFAULT_CALIBRATION_HOLD_MS,
            result_hold_ms: DEFAULT_RESULT_HOLD_MS,
            open_pulse_us: DEFAULT_OPEN_PULSE_US,
            close_pulse_us: DEFAULT_CLOSE_PULSE_US,
            identity_capacity: IDENTITY_CAPACITY,
            max_handshake_attempts: None,
            serial: SerialConfig::default(),
        }
    }
}

impl BringupConfig {
    /// Load and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails [`validate`](Self::validate).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`BringupError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_window_ms == 0 {
            return Err(BringupError::config("timeout_window_ms must be non-zero"));
        }
        if self.identity_capacity == 0 || self.identity_capacity > u8::MAX as usize {
            return Err(BringupError::config(format!(
                "identity_capacity must be between 1 and 255, got {}",
                self.identity_capacity
            )));
        }
        if self.max_handshake_attempts == Some(0) {
            return Err(BringupError::config(
                "max_handshake_attempts must be at least 1",
            ));
        }
        if self.serial.baud_rate == 0 {
            return Err(BringupError::config("serial.baud_rate must be non-zero"));
        }
        if self.open_pulse_us == 0 || self.close_pulse_us == 0 {
            return Err(BringupError::config("actuator pulses must be non-zero"));
        }
        Ok(())
    }

    pub fn timeout_window(&self) -> Duration {
        Duration::from_millis(self.timeout_window_ms)
    }

    /// Unarmed timeout window with the configured period and cadence.
    pub fn build_timeout_window(&self) -> TimeoutWindow {
        TimeoutWindow::new(self.timeout_window(), self.cadence)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn identity_hold(&self) -> Duration {
        Duration::from_millis(self.identity_hold_ms)
    }

    pub fn calibration_hold(&self) -> Duration {
        Duration::from_millis(self.calibration_hold_ms)
    }

    pub fn result_hold(&self) -> Duration {
        Duration::from_millis(self.result_hold_ms)
    }

    pub fn open_pulse(&self) -> Duration {
        Duration::from_micros(self.open_pulse_us)
    }

    pub fn close_pulse(&self) -> Duration {
        Duration::from_micros(self.close_pulse_us)
    }
}
