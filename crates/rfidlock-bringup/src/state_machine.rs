//! Bring-up state machine.
//!
//! The reader is brought up through a fixed sequence of steps. Each step
//! is entered once; there are no backward transitions and no step is
//! skipped.
//!
//! # States
//!
//! ```text
//! AwaitingEcho → Identity → Calibration → ProtocolSelect → TagPoll → Idle
//! ```
//!
//! `Idle` is terminal.
//!
//! # Examples
//!
//! ```
//! use rfidlock_bringup::{BringupState, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! assert_eq!(machine.current_state(), &BringupState::AwaitingEcho);
//!
//! machine.transition_to(BringupState::Identity).unwrap();
//! assert!(machine.transition_to(BringupState::AwaitingEcho).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use rfidlock_core::{Error, Result};

/// Six states and five transitions; the full sequence always fits.
const MAX_HISTORY_SIZE: usize = 8;

/// Steps of the bring-up sequence, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BringupState {
    /// Sending echo commands until the reader answers.
    AwaitingEcho,

    /// Reading the reader identification string.
    Identity,

    /// Sweeping the tag detector power table.
    Calibration,

    /// Selecting the air-interface protocol.
    ProtocolSelect,

    /// Polling once for a tag in the field.
    TagPoll,

    /// Terminal display state.
    Idle,
}

impl fmt::Display for BringupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            BringupState::AwaitingEcho => "AWAITING_ECHO",
            BringupState::Identity => "IDENTITY",
            BringupState::Calibration => "CALIBRATION",
            BringupState::ProtocolSelect => "PROTOCOL_SELECT",
            BringupState::TagPoll => "TAG_POLL",
            BringupState::Idle => "IDLE",
        };
        write!(f, "{}", state_str)
    }
}

impl BringupState {
    /// The step that follows this one, or `None` for `Idle`.
    pub fn next(&self) -> Option<BringupState> {
        match self {
            BringupState::AwaitingEcho => Some(BringupState::Identity),
            BringupState::Identity => Some(BringupState::Calibration),
            BringupState::Calibration => Some(BringupState::ProtocolSelect),
            BringupState::ProtocolSelect => Some(BringupState::TagPoll),
            BringupState::TagPoll => Some(BringupState::Idle),
            BringupState::Idle => None,
        }
    }

    /// Only the immediately following step is reachable.
    ///
    /// # Examples
    ///
    /// ```
    /// use rfidlock_bringup::BringupState;
    ///
    /// assert!(BringupState::Calibration.can_transition_to(&BringupState::ProtocolSelect));
    /// assert!(!BringupState::Calibration.can_transition_to(&BringupState::TagPoll));
    /// assert!(!BringupState::Idle.can_transition_to(&BringupState::AwaitingEcho));
    /// ```
    pub fn can_transition_to(&self, target: &BringupState) -> bool {
        self.next().as_ref() == Some(target)
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

/// A single state transition with timestamp.
///
/// The timestamp is process-local and not serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: BringupState,
    pub to: BringupState,

    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    pub fn new(from: BringupState, to: BringupState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }
}

/// Tracks the current step and the transitions taken so far.
#[derive(Debug)]
pub struct StateMachine {
    current_state: BringupState,
    state_entered_at: Instant,
    history: VecDeque<StateTransition>,
}

impl StateMachine {
    /// Create a machine in `AwaitingEcho`.
    pub fn new() -> Self {
        Self::starting_at(BringupState::AwaitingEcho)
    }

    /// Create a machine starting at an arbitrary step.
    ///
    /// Useful for exercising a single step in isolation.
    pub fn starting_at(state: BringupState) -> Self {
        Self {
            current_state: state,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_state(&self) -> &BringupState {
        &self.current_state
    }

    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Transitions taken, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Move to `new_state` if it is the next step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] for any other target.
    pub fn transition_to(&mut self, new_state: BringupState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);
        self.current_state = new_state;
        self.state_entered_at = Instant::now();

        self.history.push_back(transition.clone());
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }

        Ok(transition)
    }

    /// Move to the next step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] when already `Idle`.
    pub fn advance(&mut self) -> Result<StateTransition> {
        let next = self.current_state.next().ok_or_else(|| Error::InvalidStateTransition {
            from: self.current_state.to_string(),
            to: self.current_state.to_string(),
        })?;
        self.transition_to(next)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ALL: [BringupState; 6] = [
        BringupState::AwaitingEcho,
        BringupState::Identity,
        BringupState::Calibration,
        BringupState::ProtocolSelect,
        BringupState::TagPoll,
        BringupState::Idle,
    ];

    #[test]
    fn test_full_sequence_in_order() {
        let mut machine = StateMachine::new();
        for state in &ALL[1..] {
            machine.transition_to(*state).unwrap();
        }

        assert!(machine.current_state().is_terminal());
        assert_eq!(machine.history().len(), 5);
        assert_eq!(machine.history()[0].from, BringupState::AwaitingEcho);
        assert_eq!(machine.history()[4].to, BringupState::Idle);
    }

    #[test]
    fn test_only_forward_single_steps_allowed() {
        for (i, from) in ALL.iter().enumerate() {
            for (j, to) in ALL.iter().enumerate() {
                assert_eq!(from.can_transition_to(to), j == i + 1, "{from} -> {to}");
            }
        }
    }

    #[rstest]
    #[case(BringupState::AwaitingEcho, BringupState::Calibration)]
    #[case(BringupState::Identity, BringupState::AwaitingEcho)]
    #[case(BringupState::TagPoll, BringupState::TagPoll)]
    fn test_invalid_transition_leaves_state(#[case] from: BringupState, #[case] to: BringupState) {
        let mut machine = StateMachine::starting_at(from);
        let error = machine.transition_to(to).unwrap_err();

        assert!(matches!(error, Error::InvalidStateTransition { .. }));
        assert_eq!(machine.current_state(), &from);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_advance_stops_at_idle() {
        let mut machine = StateMachine::starting_at(BringupState::TagPoll);
        machine.advance().unwrap();
        assert_eq!(machine.current_state(), &BringupState::Idle);
        assert!(machine.advance().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_in_state_follows_runtime_clock() {
        let mut machine = StateMachine::new();
        let start = Instant::now();

        tokio::time::sleep(Duration::from_millis(175)).await;
        assert_eq!(machine.time_in_current_state(), Duration::from_millis(175));

        let transition = machine.advance().unwrap();
        assert_eq!(transition.timestamp - start, Duration::from_millis(175));
        assert_eq!(machine.time_in_current_state(), Duration::ZERO);
    }

    #[test]
    fn test_state_display_and_serialization() {
        assert_eq!(BringupState::ProtocolSelect.to_string(), "PROTOCOL_SELECT");
        let json = serde_json::to_string(&BringupState::AwaitingEcho).unwrap();
        assert_eq!(json, r#""awaiting_echo""#);
    }
}
