//! Common types shared across hardware device implementations.
//!
//! This module defines device information, serial link settings and the
//! logic level of a single control line.

use rfidlock_core::constants::DEFAULT_BAUD_RATE;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic device information.
///
/// Contains metadata about a hardware device: name, model and, when the
/// device reports one, its firmware version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "/dev/ttyUSB0", "Simulated Reader").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional firmware version string.
    pub firmware_version: Option<String>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            firmware_version: None,
        }
    }

    /// Set the firmware version.
    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }
}

/// Parity setting of the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

/// Asynchronous serial framing applied by [`SerialLink::init`].
///
/// The reader expects 8 data bits, no parity, one stop bit and no flow
/// control; only the baud rate is normally changed.
///
/// [`SerialLink::init`]: crate::link::SerialLink::init
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Link speed in bits per second.
    pub baud_rate: u32,

    /// Data bits per character.
    pub data_bits: u8,

    pub parity: Parity,

    /// Stop bits per character (1 or 2).
    pub stop_bits: u8,
}

impl LinkSettings {
    /// 8N1 settings at the given baud rate.
    pub fn with_baud_rate(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Self::default()
        }
    }
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
        }
    }
}

impl fmt::Display for LinkSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Even => 'E',
            Parity::Odd => 'O',
        };
        write!(
            f,
            "{} {}{}{}",
            self.baud_rate, self.data_bits, parity, self.stop_bits
        )
    }
}

/// Logic level of a single control line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineLevel {
    #[default]
    Low,
    High,
}

impl fmt::Display for LineLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::High => write!(f, "high"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info_builder() {
        let info = DeviceInfo::new("/dev/ttyUSB0", "CR95HF").with_firmware_version("NFC FS2JAST4");

        assert_eq!(info.name, "/dev/ttyUSB0");
        assert_eq!(info.model, "CR95HF");
        assert_eq!(info.firmware_version, Some("NFC FS2JAST4".to_string()));
    }

    #[test]
    fn test_link_settings_default_is_8n1() {
        let settings = LinkSettings::default();
        assert_eq!(settings.to_string(), "57600 8N1");
        assert_eq!(LinkSettings::with_baud_rate(115_200).to_string(), "115200 8N1");
    }

    #[test]
    fn test_link_settings_partial_json() {
        let settings: LinkSettings = serde_json::from_str(r#"{"baud_rate": 9600}"#).unwrap();
        assert_eq!(settings, LinkSettings::with_baud_rate(9600));
    }

    #[test]
    fn test_line_level_serialization() {
        let json = serde_json::to_string(&LineLevel::High).unwrap();
        assert_eq!(json, r#""high""#);
        assert_eq!(LineLevel::default(), LineLevel::Low);
    }
}
