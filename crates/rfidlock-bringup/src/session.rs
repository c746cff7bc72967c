//! The reader bring-up sequence.
//!
//! [`ReaderProtocol`] drives a [`SerialLink`] through the fixed step
//! sequence and renders every outcome on a [`StatusOutput`]. Classification
//! faults are rendered, logged and recorded, and the sequence moves on.
//! Only transport and output failures end a run early.
//!
//! # Status Patterns
//!
//! | Step            | Outcome                    | Pattern |
//! |-----------------|----------------------------|---------|
//! | Handshake       | waiting / reply read       | `0x0F` / `0xF0` |
//! | Identity        | each payload byte          | the byte |
//! | Identity        | malformed length           | `0xFF` |
//! | Calibration     | detected / timeout / other | `0x0F` / `0xF0` / `0xFF` |
//! | Protocol select | ok / known error / other   | `0x03` / `0xC0` / `0xFF` |
//! | Tag poll        | detected / absent / other  | `0x0A` / `0xA0` / `0xAA` |
//! | Idle            |                            | `0x07` |

use crate::config::BringupConfig;
use crate::error::Result;
use crate::report::{BringupReport, CalibrationStep};
use crate::state_machine::{BringupState, StateMachine};
use rfidlock_core::constants::{ECHO_COMMAND, IDENTITY_HEADER_LEN, TIMEOUT_SENTINEL};
use rfidlock_core::{Fault, SelectOutcome, StatusPattern, TagPollOutcome};
use rfidlock_hardware::{SerialLink, SerialTransport, StatusOutput};
use rfidlock_protocol::{
    CalibrationResponse, CalibrationSweep, IdentityResponse, ReaderCommand, SelectResponse,
    TagPollResponse,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bring-up session over one link and one status bus.
///
/// # Examples
///
/// ```no_run
/// use rfidlock_bringup::{BringupConfig, ReaderProtocol};
/// use rfidlock_bringup::display::LedBar;
/// use rfidlock_hardware::SerialLink;
/// use rfidlock_hardware::mock::SimulatedReader;
///
/// #[tokio::main]
/// async fn main() -> rfidlock_bringup::Result<()> {
///     let config = BringupConfig::default();
///     let mut link = SerialLink::new(SimulatedReader::default(), config.build_timeout_window());
///     link.init(&config.serial.link_settings()).await?;
///     link.arm_timeout();
///
///     let mut session = ReaderProtocol::new(link, LedBar::stdout(), config);
///     let report = session.run().await?;
///     println!("{} faults", report.faults().len());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct ReaderProtocol<T, S> {
    link: SerialLink<T>,
    status: S,
    config: BringupConfig,
    machine: StateMachine,
    report: BringupReport,
}

impl<T: SerialTransport, S: StatusOutput> ReaderProtocol<T, S> {
    /// Create a session in `AwaitingEcho`.
    ///
    /// The link is expected to be initialized and its timeout window armed.
    pub fn new(link: SerialLink<T>, status: S, config: BringupConfig) -> Self {
        Self {
            link,
            status,
            config,
            machine: StateMachine::new(),
            report: BringupReport::default(),
        }
    }

    /// Run every step in order and render the idle pattern.
    ///
    /// Returns the report once `Idle` is displayed. The pattern stays on
    /// the bus until the next render.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or output failure, or when a
    /// configured handshake attempt limit is exhausted.
    pub async fn run(&mut self) -> Result<BringupReport> {
        info!("Starting reader bring-up");

        while !self.machine.current_state().is_terminal() {
            match *self.machine.current_state() {
                BringupState::AwaitingEcho => {
                    self.report.handshake_attempts = self.handshake().await?;
                }
                BringupState::Identity => {
                    self.report.identity = Some(self.identity().await?);
                }
                BringupState::Calibration => {
                    self.report.calibration = self.calibration().await?;
                }
                BringupState::ProtocolSelect => {
                    self.report.protocol_select = Some(self.protocol_select().await?);
                }
                BringupState::TagPoll => {
                    self.report.tag_poll = Some(self.tag_poll().await?);
                }
                BringupState::Idle => {}
            }

            let spent = self.machine.time_in_current_state();
            let transition = self.machine.advance()?;
            info!(
                "Bring-up {} -> {} after {:?}",
                transition.from, transition.to, spent
            );
        }

        self.idle().await?;
        Ok(self.report.clone())
    }

    /// Send echo commands until the reader echoes back.
    ///
    /// Each attempt renders the waiting pattern, sends one echo byte, waits
    /// for a reply or the timeout window, then renders the reply-read
    /// pattern. Failed attempts wait the settle delay and drop any late
    /// reply before retrying, so a stale echo never completes the
    /// handshake.
    ///
    /// Returns the number of attempts made.
    ///
    /// # Errors
    ///
    /// Returns [`rfidlock_core::Error::HandshakeExhausted`] when the
    /// configured attempt limit is reached.
    pub async fn handshake(&mut self) -> Result<u32> {
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            self.status.render(StatusPattern::HANDSHAKE_WAIT).await?;
            self.link.write_byte(ECHO_COMMAND).await?;
            let reply = self.link.read_byte_or_timeout().await?;
            self.status.render(StatusPattern::HANDSHAKE_DONE).await?;

            if reply == ECHO_COMMAND {
                info!("Reader answered echo after {} attempt(s)", attempts);
                return Ok(attempts);
            }

            let fault = if reply == TIMEOUT_SENTINEL {
                Fault::Timeout
            } else {
                Fault::UnexpectedResponse { code: reply }
            };
            warn!("Handshake attempt {} failed: {}", attempts, fault);

            if let Some(limit) = self.config.max_handshake_attempts
                && attempts >= limit
            {
                return Err(rfidlock_core::Error::HandshakeExhausted { attempts }.into());
            }

            self.hold(self.config.settle_delay()).await;
            self.link.discard_input().await?;
        }
    }

    /// Read the reader identification string.
    ///
    /// Only the first `identity_capacity` payload bytes are kept; the rest
    /// are read and dropped so the link stays in step. Stored bytes are
    /// shown one at a time on the status bus.
    pub async fn identity(&mut self) -> Result<IdentityResponse> {
        self.link.send_frame(&ReaderCommand::Identity.frame()).await?;

        let [status, declared] = self.link.read_exact::<IDENTITY_HEADER_LEN>().await?;
        let mut identity =
            IdentityResponse::new(status, declared as usize, self.config.identity_capacity);
        while !identity.is_complete() {
            let byte = self.link.read_byte().await?;
            identity.push(byte);
        }

        info!(
            "Reader identity: {:?} (status 0x{:02X})",
            identity.display_text(),
            identity.status()
        );

        for byte in identity.payload().to_vec() {
            self.status.render(StatusPattern::new(byte)).await?;
            self.hold(self.config.identity_hold()).await;
        }

        if let Some(fault) = identity.fault() {
            warn!(
                "Identity truncated, {} byte(s) discarded: {}",
                identity.discarded(),
                fault
            );
            self.status.render(StatusPattern::ERROR).await?;
            self.hold(self.config.identity_hold()).await;
        }

        self.hold(self.config.settle_delay()).await;
        Ok(identity)
    }

    /// Sweep the tag detector power table in declared order.
    ///
    /// Results are displayed and reported but not retained by the reader.
    pub async fn calibration(&mut self) -> Result<Vec<CalibrationStep>> {
        let mut steps = Vec::with_capacity(CalibrationSweep::new().len());

        for (power, frame) in CalibrationSweep::new() {
            self.link.send_frame(&frame).await?;
            let response = CalibrationResponse::new(self.link.read_exact().await?);
            let outcome = response.outcome();

            match outcome.fault() {
                Some(fault) => warn!("Calibration 0x{:02X}: {}", power, fault),
                None => debug!("Calibration 0x{:02X}: {}", power, outcome),
            }

            self.show(outcome.pattern(), self.config.calibration_hold())
                .await?;
            steps.push(CalibrationStep { power, outcome });
        }

        Ok(steps)
    }

    /// Select the air-interface protocol.
    pub async fn protocol_select(&mut self) -> Result<SelectOutcome> {
        self.link
            .send_frame(&ReaderCommand::ProtocolSelect.frame())
            .await?;
        let outcome = SelectResponse::new(self.link.read_exact().await?).outcome();

        match outcome.fault() {
            Some(fault) => warn!("Protocol select failed: {}", fault),
            None => info!("Protocol select: {}", outcome),
        }

        self.show(outcome.pattern(), self.config.result_hold()).await?;
        Ok(outcome)
    }

    /// Poll once for a tag in the field.
    pub async fn tag_poll(&mut self) -> Result<TagPollOutcome> {
        self.link.send_frame(&ReaderCommand::TagDetect.frame()).await?;
        let outcome = TagPollResponse::new(self.link.read_exact().await?).outcome();

        match outcome.fault() {
            Some(fault) => warn!("Tag poll failed: {}", fault),
            None => info!("Tag poll: {}", outcome),
        }

        self.show(outcome.pattern(), self.config.result_hold()).await?;
        Ok(outcome)
    }

    /// Render the idle pattern.
    pub async fn idle(&mut self) -> Result<()> {
        self.status.render(StatusPattern::IDLE).await?;
        info!("Reader bring-up complete, idle");
        Ok(())
    }

    pub fn state(&self) -> BringupState {
        *self.machine.current_state()
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Report of the steps completed so far.
    pub fn report(&self) -> &BringupReport {
        &self.report
    }

    pub fn link(&self) -> &SerialLink<T> {
        &self.link
    }

    pub fn into_parts(self) -> (SerialLink<T>, S) {
        (self.link, self.status)
    }

    /// Render `pattern`, hold it, then clear the bus.
    async fn show(&mut self, pattern: StatusPattern, hold: Duration) -> Result<()> {
        self.status.render(pattern).await?;
        self.hold(hold).await;
        self.status.render(StatusPattern::OFF).await?;
        Ok(())
    }

    async fn hold(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
