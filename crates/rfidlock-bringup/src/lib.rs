//! Reader bring-up sequence.
//!
//! This crate sequences the reader module through handshake, identity,
//! calibration, protocol select and tag poll, rendering each outcome on
//! the status bus, and ends in a terminal idle display.

pub mod config;
pub mod display;
pub mod error;
pub mod report;
pub mod session;
pub mod state_machine;

pub use config::{BringupConfig, SerialConfig};
pub use display::LedBar;
pub use error::{BringupError, Result};
pub use report::{BringupReport, CalibrationStep};
pub use session::ReaderProtocol;
pub use state_machine::{BringupState, StateMachine, StateTransition};
