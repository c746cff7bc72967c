//! Error types for the bring-up sequence.
//!
//! Classification faults (timeouts, reader error codes, malformed lengths)
//! are not errors: they are rendered and recorded in the report. The
//! variants here stop the run.

use rfidlock_hardware::HardwareError;

pub type Result<T> = std::result::Result<T, BringupError>;

#[derive(Debug, thiserror::Error)]
pub enum BringupError {
    /// Transport or output device failure.
    #[error(transparent)]
    Hardware(#[from] HardwareError),

    /// Sequencing failure (invalid transition, handshake exhausted).
    #[error(transparent)]
    Sequence(#[from] rfidlock_core::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl BringupError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
