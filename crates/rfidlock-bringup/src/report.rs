//! Results of a bring-up run.

use rfidlock_core::{CalibrationOutcome, Fault, SelectOutcome, TagPollOutcome};
use rfidlock_protocol::IdentityResponse;
use serde::Serialize;

/// Result of one calibration power level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalibrationStep {
    pub power: u8,
    pub outcome: CalibrationOutcome,
}

/// Everything observed during a run, in step order.
///
/// Serializes to JSON for the driver's summary output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BringupReport {
    /// Echo commands sent before the reader answered.
    pub handshake_attempts: u32,

    pub identity: Option<IdentityResponse>,
    pub calibration: Vec<CalibrationStep>,
    pub protocol_select: Option<SelectOutcome>,
    pub tag_poll: Option<TagPollOutcome>,
}

impl BringupReport {
    /// Faults from every completed step, in step order.
    ///
    /// Failed handshake attempts are not listed; they show up as
    /// `handshake_attempts > 1`.
    pub fn faults(&self) -> Vec<Fault> {
        let identity = self.identity.iter().filter_map(IdentityResponse::fault);
        let calibration = self.calibration.iter().filter_map(|step| step.outcome.fault());
        let select = self.protocol_select.iter().filter_map(SelectOutcome::fault);
        let poll = self.tag_poll.iter().filter_map(TagPollOutcome::fault);

        identity.chain(calibration).chain(select).chain(poll).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.faults().is_empty()
    }

    /// Identity payload as text, if the identity step ran.
    pub fn identity_text(&self) -> Option<String> {
        self.identity.as_ref().map(IdentityResponse::display_text)
    }
}
