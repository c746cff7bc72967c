//! Simulated reader module.
//!
//! A transport that plays the reader's side of the link: it rebuilds
//! command frames from the bytes written to it and queues the response the
//! reader would send. Useful for running the full bring-up sequence on a
//! host without hardware.

use crate::{
    Result,
    traits::SerialTransport,
    types::{DeviceInfo, LinkSettings},
};
use rfidlock_core::constants::{
    CALIBRATION_TAG_DETECTED, CALIBRATION_TIMEOUT, ECHO_COMMAND, TAG_DETECT_FRAME_OK,
    TAG_DETECT_NO_FRAME,
};
use rfidlock_protocol::{CommandFrame, CommandStreamParser, ReaderCommand};
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

/// Identity string reported by a CR95HF, NUL terminated, followed by its CRC.
const DEFAULT_IDENTITY: &[u8] = b"NFC FS2JAST4\0\x2A\xCE";

/// Power level at which the simulated tag detector stops detecting.
const DEFAULT_REFERENCE_POWER: u8 = 0x74;

/// Behaviour of a [`SimulatedReader`].
///
/// # Examples
///
/// ```
/// use rfidlock_hardware::mock::ReaderProfile;
///
/// let profile = ReaderProfile::default()
///     .with_select_code(0x82)
///     .with_tag_present(false)
///     .with_silent_echoes(2);
/// assert_eq!(profile.select_code, 0x82);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderProfile {
    /// Identity payload returned after the two header bytes.
    pub identity: Vec<u8>,

    /// Status byte of the identity response.
    pub identity_status: u8,

    /// Calibration reports tag-detected below this power, timeout at or above.
    pub reference_power: u8,

    /// First byte of the protocol select response.
    pub select_code: u8,

    /// Whether a tag answers the tag detect command.
    pub tag_present: bool,

    /// Number of initial echo commands left unanswered.
    pub silent_echoes: usize,
}

impl ReaderProfile {
    pub fn with_identity(mut self, identity: impl Into<Vec<u8>>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn with_reference_power(mut self, power: u8) -> Self {
        self.reference_power = power;
        self
    }

    pub fn with_select_code(mut self, code: u8) -> Self {
        self.select_code = code;
        self
    }

    pub fn with_tag_present(mut self, present: bool) -> Self {
        self.tag_present = present;
        self
    }

    pub fn with_silent_echoes(mut self, count: usize) -> Self {
        self.silent_echoes = count;
        self
    }
}

impl Default for ReaderProfile {
    fn default() -> Self {
        Self {
            identity: DEFAULT_IDENTITY.to_vec(),
            identity_status: 0x00,
            reference_power: DEFAULT_REFERENCE_POWER,
            select_code: 0x00,
            tag_present: true,
            silent_echoes: 0,
        }
    }
}

/// Transport answering bring-up commands like a reader module would.
///
/// Responses are queued synchronously when the last byte of a command is
/// written, so a read never races the reply. With nothing queued,
/// `read_byte` waits forever, which is what a silent reader looks like to
/// the host.
///
/// # Examples
///
/// ```
/// use rfidlock_hardware::mock::SimulatedReader;
/// use rfidlock_hardware::traits::SerialTransport;
///
/// #[tokio::main]
/// async fn main() -> rfidlock_hardware::Result<()> {
///     let mut reader = SimulatedReader::default();
///
///     reader.write_byte(0x55).await?;
///     assert_eq!(reader.read_byte().await?, 0x55);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct SimulatedReader {
    profile: ReaderProfile,
    parser: CommandStreamParser,

    /// Response bytes not yet read by the host
    outbound: VecDeque<u8>,

    /// Every complete frame received, in order
    received: Vec<CommandFrame>,

    /// Echo commands still to be ignored
    silent_echoes: usize,
}

impl SimulatedReader {
    pub fn new(profile: ReaderProfile) -> Self {
        Self {
            silent_echoes: profile.silent_echoes,
            profile,
            parser: CommandStreamParser::new(),
            outbound: VecDeque::new(),
            received: Vec::new(),
        }
    }

    pub fn profile(&self) -> &ReaderProfile {
        &self.profile
    }

    /// Complete frames received so far.
    pub fn frames(&self) -> &[CommandFrame] {
        &self.received
    }

    /// Recognized commands received so far, in order.
    pub fn commands(&self) -> Vec<ReaderCommand> {
        self.received
            .iter()
            .filter_map(|frame| ReaderCommand::from_frame(frame.as_bytes()))
            .collect()
    }

    /// Number of response bytes waiting to be read.
    pub fn pending_response(&self) -> usize {
        self.outbound.len()
    }

    fn answer(&mut self, frame: CommandFrame) {
        let command = ReaderCommand::from_frame(frame.as_bytes());
        self.received.push(frame.clone());

        let Some(command) = command else {
            warn!("Simulated reader ignoring unknown frame {}", frame);
            return;
        };
        debug!("Simulated reader received {}", command);

        match command {
            ReaderCommand::Echo => {
                if self.silent_echoes > 0 {
                    self.silent_echoes -= 1;
                    trace!("Simulated reader staying silent ({} left)", self.silent_echoes);
                    return;
                }
                self.outbound.push_back(ECHO_COMMAND);
            }
            ReaderCommand::Identity => {
                let length = self.profile.identity.len().min(u8::MAX as usize) as u8;
                self.outbound.push_back(self.profile.identity_status);
                self.outbound.push_back(length);
                self.outbound
                    .extend(&self.profile.identity[..length as usize]);
            }
            ReaderCommand::Calibration { power } => {
                let outcome = if power < self.profile.reference_power {
                    CALIBRATION_TAG_DETECTED
                } else {
                    CALIBRATION_TIMEOUT
                };
                self.outbound.extend([0x00, 0x01, outcome]);
            }
            ReaderCommand::ProtocolSelect => {
                self.outbound.extend([self.profile.select_code, 0x00]);
            }
            ReaderCommand::TagDetect => {
                let code = if self.profile.tag_present {
                    TAG_DETECT_FRAME_OK
                } else {
                    TAG_DETECT_NO_FRAME
                };
                self.outbound.extend([code, 0x00]);
            }
        }
    }
}

impl Default for SimulatedReader {
    fn default() -> Self {
        Self::new(ReaderProfile::default())
    }
}

impl SerialTransport for SimulatedReader {
    async fn configure(&mut self, settings: &LinkSettings) -> Result<()> {
        debug!("Simulated reader configured at {}", settings);
        Ok(())
    }

    async fn write_byte(&mut self, byte: u8) -> Result<()> {
        if self.parser.push(byte) {
            while let Some(frame) = self.parser.next_frame() {
                self.answer(frame);
            }
        }
        Ok(())
    }

    async fn read_byte(&mut self) -> Result<u8> {
        match self.outbound.pop_front() {
            Some(byte) => Ok(byte),
            None => std::future::pending().await,
        }
    }

    async fn discard_input(&mut self) -> Result<usize> {
        let dropped = self.outbound.len();
        self.outbound.clear();
        Ok(dropped)
    }

    fn info(&self) -> DeviceInfo {
        let firmware: String = self
            .profile
            .identity
            .iter()
            .take_while(|b| **b != 0)
            .map(|b| *b as char)
            .collect();
        DeviceInfo::new("Simulated Reader", "CR95HF (simulated)").with_firmware_version(firmware)
    }
}
