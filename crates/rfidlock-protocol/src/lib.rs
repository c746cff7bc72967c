//! Command framing and response decoding for the reader module.
//!
//! The reader speaks a fixed-layout binary protocol over a serial link.
//! This crate owns the byte-level contracts: building command frames,
//! recognizing commands in a byte stream, and decoding responses into the
//! classifications rendered by the bring-up sequence.

pub mod commands;
pub mod frame;
pub mod response;
pub mod stream_parser;

pub use commands::{CalibrationSweep, ReaderCommand, ResponseLength};
pub use frame::CommandFrame;
pub use response::{
    CalibrationResponse, FixedResponse, IdentityResponse, SelectResponse, TagPollResponse,
};
pub use stream_parser::{CommandStreamParser, ParserState};
