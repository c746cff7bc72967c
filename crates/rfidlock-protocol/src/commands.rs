//! Reader command definitions.
//!
//! This module defines the commands issued during bring-up. Each command
//! knows its wire frame and the shape of the response the reader sends
//! back, so the sequence never reads more bytes than the contract allows.
//!
//! # Command Set
//!
//! - `Echo` (`55`): liveness check, answered with the same byte
//! - `Identity` (`01 00`): reader identification string
//! - `Calibration` (`07 0E ...`): tag-detector idle command with a patched
//!   power byte
//! - `ProtocolSelect` (`02 02 02 00`): select ISO/IEC 14443-A
//! - `TagDetect` (`04 02 26 07`): send REQA and report whether a tag answered
//!
//! # Examples
//!
//! ```
//! use rfidlock_protocol::{ReaderCommand, ResponseLength};
//!
//! let command = ReaderCommand::ProtocolSelect;
//! assert_eq!(command.frame().as_bytes(), &[0x02, 0x02, 0x02, 0x00]);
//! assert_eq!(command.response_len(), ResponseLength::Fixed(2));
//! ```

use crate::frame::CommandFrame;
use rfidlock_core::constants::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Expected response shape for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseLength {
    /// The response always has exactly this many bytes.
    Fixed(usize),

    /// A two-byte header declares the payload length.
    Declared,
}

/// A command understood by the reader module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderCommand {
    Echo,
    Identity,

    /// Calibration idle command at the given power (DAC high) level.
    Calibration { power: u8 },

    ProtocolSelect,
    TagDetect,
}

impl ReaderCommand {
    /// Command code byte.
    pub fn code(&self) -> u8 {
        match self {
            Self::Echo => ECHO_COMMAND,
            Self::Identity => IDENTITY_COMMAND[0],
            Self::Calibration { .. } => CALIBRATION_TEMPLATE[0],
            Self::ProtocolSelect => PROTOCOL_SELECT_COMMAND[0],
            Self::TagDetect => TAG_DETECT_COMMAND[0],
        }
    }

    /// Build the wire frame for this command.
    pub fn frame(&self) -> CommandFrame {
        match self {
            Self::Echo => CommandFrame::from_static(&[ECHO_COMMAND]),
            Self::Identity => CommandFrame::from_static(&IDENTITY_COMMAND),
            Self::Calibration { power } => calibration_frame(*power),
            Self::ProtocolSelect => CommandFrame::from_static(&PROTOCOL_SELECT_COMMAND),
            Self::TagDetect => CommandFrame::from_static(&TAG_DETECT_COMMAND),
        }
    }

    /// Shape of the response the reader sends for this command.
    pub fn response_len(&self) -> ResponseLength {
        match self {
            Self::Echo => ResponseLength::Fixed(1),
            Self::Identity => ResponseLength::Declared,
            Self::Calibration { .. } => ResponseLength::Fixed(CALIBRATION_RESPONSE_LEN),
            Self::ProtocolSelect => ResponseLength::Fixed(PROTOCOL_SELECT_RESPONSE_LEN),
            Self::TagDetect => ResponseLength::Fixed(TAG_DETECT_RESPONSE_LEN),
        }
    }

    /// Recognize a complete frame received from the host side.
    ///
    /// Returns `None` for frames outside the bring-up command set. The
    /// calibration power byte is read back from offset 12.
    ///
    /// # Examples
    ///
    /// ```
    /// use rfidlock_protocol::ReaderCommand;
    ///
    /// let frame = ReaderCommand::Calibration { power: 0x7C }.frame();
    /// assert_eq!(
    ///     ReaderCommand::from_frame(frame.as_bytes()),
    ///     Some(ReaderCommand::Calibration { power: 0x7C })
    /// );
    /// assert_eq!(ReaderCommand::from_frame(&[0x09, 0x00]), None);
    /// ```
    pub fn from_frame(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [ECHO_COMMAND] => Some(Self::Echo),
            _ if bytes == IDENTITY_COMMAND => Some(Self::Identity),
            _ if bytes == PROTOCOL_SELECT_COMMAND => Some(Self::ProtocolSelect),
            _ if bytes == TAG_DETECT_COMMAND => Some(Self::TagDetect),
            _ if bytes.len() == CALIBRATION_TEMPLATE.len()
                && bytes[..2] == CALIBRATION_TEMPLATE[..2] =>
            {
                Some(Self::Calibration {
                    power: bytes[CALIBRATION_POWER_OFFSET],
                })
            }
            _ => None,
        }
    }
}

impl fmt::Display for ReaderCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Echo => write!(f, "ECHO"),
            Self::Identity => write!(f, "IDN"),
            Self::Calibration { power } => write!(f, "CALIBRATE(0x{power:02X})"),
            Self::ProtocolSelect => write!(f, "PROTOCOLSELECT"),
            Self::TagDetect => write!(f, "SENDRECV(REQA)"),
        }
    }
}

/// Build the calibration frame for one power level.
fn calibration_frame(power: u8) -> CommandFrame {
    let mut bytes = CALIBRATION_TEMPLATE;
    bytes[CALIBRATION_POWER_OFFSET] = power;
    CommandFrame::from_slice(&bytes)
}

/// Iterator over the calibration power table in declared order.
///
/// Each item pairs the power level with the frame that carries it.
///
/// # Examples
///
/// ```
/// use rfidlock_protocol::CalibrationSweep;
///
/// let powers: Vec<u8> = CalibrationSweep::new().map(|(power, _)| power).collect();
/// assert_eq!(powers, vec![0x00, 0xFC, 0x7C, 0x3C, 0x5C, 0x6C, 0x74, 0x70]);
/// ```
#[derive(Debug, Clone)]
pub struct CalibrationSweep {
    levels: std::slice::Iter<'static, u8>,
}

impl CalibrationSweep {
    pub fn new() -> Self {
        Self {
            levels: CALIBRATION_POWER_LEVELS.iter(),
        }
    }
}

impl Default for CalibrationSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for CalibrationSweep {
    type Item = (u8, CommandFrame);

    fn next(&mut self) -> Option<Self::Item> {
        self.levels
            .next()
            .map(|power| (*power, ReaderCommand::Calibration { power: *power }.frame()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.levels.size_hint()
    }
}

impl ExactSizeIterator for CalibrationSweep {}
