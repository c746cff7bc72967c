//! Stream parser for reader command frames.
//!
//! The reader receives commands as an unframed byte stream over the serial
//! link. This parser rebuilds complete frames from bytes fed one at a time
//! (or in chunks), which is what a device-side emulation of the reader
//! needs to answer each command.
//!
//! # Framing
//!
//! ```text
//! 55                 echo, complete on its own
//! CMD LEN DATA[LEN]  every other command
//! ```
//!
//! # Usage
//!
//! ```
//! use rfidlock_protocol::CommandStreamParser;
//!
//! let mut parser = CommandStreamParser::new();
//!
//! parser.feed(&[0x02, 0x02]);
//! assert!(parser.next_frame().is_none());
//!
//! parser.feed(&[0x02, 0x00, 0x55]);
//! assert_eq!(parser.next_frame().unwrap().as_bytes(), &[0x02, 0x02, 0x02, 0x00]);
//! assert_eq!(parser.next_frame().unwrap().as_bytes(), &[0x55]);
//! ```

use bytes::{BufMut, BytesMut};
use rfidlock_core::constants::ECHO_COMMAND;
use std::collections::VecDeque;

use crate::frame::CommandFrame;

/// Largest frame the reader accepts: CMD + LEN + 255 data bytes.
const MAX_FRAME_SIZE: usize = 2 + u8::MAX as usize;

/// Recommended initial capacity for the frame queue.
const INITIAL_FRAME_QUEUE_CAPACITY: usize = 4;

/// State machine states for rebuilding command frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Waiting for a command code byte.
    WaitingCode,

    /// Command code received, waiting for the length byte.
    WaitingLength,

    /// Reading the declared number of data bytes.
    ReadingData { remaining: usize },
}

/// Stateful parser turning a byte stream into command frames.
///
/// ```text
/// ┌────────────┐  CMD != 55  ┌──────────────┐  LEN > 0  ┌─────────────┐
/// │WaitingCode │────────────>│WaitingLength │──────────>│ReadingData  │
/// └────────────┘             └──────────────┘           └─────────────┘
///    ^   │ 55 (echo)                │ LEN == 0                 │ last byte
///    │   └── frame ready            └── frame ready            └── frame ready
///    └─────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug)]
pub struct CommandStreamParser {
    /// Current parser state
    state: ParserState,

    /// Bytes of the frame being assembled
    current: BytesMut,

    /// Completed frames not yet taken
    frames: VecDeque<CommandFrame>,
}

impl CommandStreamParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::WaitingCode,
            current: BytesMut::with_capacity(MAX_FRAME_SIZE),
            frames: VecDeque::with_capacity(INITIAL_FRAME_QUEUE_CAPACITY),
        }
    }

    /// Current parser state.
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Feed a chunk of bytes into the parser.
    pub fn feed(&mut self, data: &[u8]) {
        for byte in data {
            self.push(*byte);
        }
    }

    /// Feed one byte into the parser.
    ///
    /// Returns `true` if the byte completed a frame.
    pub fn push(&mut self, byte: u8) -> bool {
        match self.state {
            ParserState::WaitingCode => {
                self.current.put_u8(byte);
                if byte == ECHO_COMMAND {
                    self.complete();
                    return true;
                }
                self.state = ParserState::WaitingLength;
                false
            }
            ParserState::WaitingLength => {
                self.current.put_u8(byte);
                if byte == 0 {
                    self.complete();
                    return true;
                }
                self.state = ParserState::ReadingData {
                    remaining: byte as usize,
                };
                false
            }
            ParserState::ReadingData { remaining } => {
                self.current.put_u8(byte);
                if remaining == 1 {
                    self.complete();
                    return true;
                }
                self.state = ParserState::ReadingData {
                    remaining: remaining - 1,
                };
                false
            }
        }
    }

    /// Take the next complete frame, if any.
    pub fn next_frame(&mut self) -> Option<CommandFrame> {
        self.frames.pop_front()
    }

    /// Number of complete frames waiting to be taken.
    pub fn pending(&self) -> usize {
        self.frames.len()
    }

    /// Drop any partially assembled frame and queued frames.
    pub fn reset(&mut self) {
        self.state = ParserState::WaitingCode;
        self.current.clear();
        self.frames.clear();
    }

    fn complete(&mut self) {
        let frame = CommandFrame::new(self.current.split().freeze());
        self.frames.push_back(frame);
        self.state = ParserState::WaitingCode;
    }
}

impl Default for CommandStreamParser {
    fn default() -> Self {
        Self::new()
    }
}
