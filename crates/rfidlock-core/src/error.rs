use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Frame errors
    #[error("Field offset {offset} out of range for {len}-byte frame")]
    FieldOutOfRange { offset: usize, len: usize },

    #[error("Response too short: expected {expected} bytes, got {actual}")]
    ShortResponse { expected: usize, actual: usize },

    // Sequence errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Reader did not echo after {attempts} attempts")]
    HandshakeExhausted { attempts: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
