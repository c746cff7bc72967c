//! Core constants for the reader bring-up sequence.
//!
//! This module defines the bit-exact command set of the serial-attached
//! reader module, the response codes the bring-up sequence classifies, the
//! status-bus patterns rendered for each outcome, and the default timings.
//!
//! # Reader Framing
//!
//! Apart from the echo byte, every command uses the same layout:
//!
//! ```text
//! CMD LEN DATA[LEN]
//! ```
//!
//! | Command | Bytes | Response |
//! |---------|-------|----------|
//! | Echo | `55` | `55` |
//! | Identity | `01 00` | `status len payload[len]` |
//! | Calibration | `07 0E ..14 bytes..` | 3 bytes, outcome in byte 2 |
//! | Protocol select | `02 02 02 00` | 2 bytes, outcome in byte 0 |
//! | Tag detect | `04 02 26 07` | 2 bytes, outcome in byte 0 |
//!
//! # Protocol Compliance
//!
//! These byte sequences must be preserved exactly for compatibility with the
//! physical reader. Modifying them breaks the bring-up sequence.

// ============================================================================
// Handshake
// ============================================================================

/// Echo command byte. The reader answers with the same byte.
pub const ECHO_COMMAND: u8 = 0x55;

/// Reserved value returned by the timeout-aware read when no byte arrived
/// before the timeout window elapsed.
///
/// # Examples
///
/// ```
/// use rfidlock_core::constants::{ECHO_COMMAND, TIMEOUT_SENTINEL};
///
/// assert_ne!(TIMEOUT_SENTINEL, ECHO_COMMAND);
/// ```
pub const TIMEOUT_SENTINEL: u8 = 0x0F;

// ============================================================================
// Identity
// ============================================================================

/// Identity request frame (`IDN`, zero-length payload).
pub const IDENTITY_COMMAND: [u8; 2] = [0x01, 0x00];

/// Length of the identity response header (status code + declared length).
pub const IDENTITY_HEADER_LEN: usize = 2;

/// Maximum number of identity payload bytes kept in memory.
///
/// The reader declares the payload length in the response header. Any
/// declaration beyond this capacity is truncated and reported as a
/// malformed length.
pub const IDENTITY_CAPACITY: usize = 16;

// ============================================================================
// Calibration
// ============================================================================

/// Idle command template used for the tag-detector calibration sweep.
///
/// The byte at [`CALIBRATION_POWER_OFFSET`] is patched with each entry of
/// [`CALIBRATION_POWER_LEVELS`] before transmission.
pub const CALIBRATION_TEMPLATE: [u8; 16] = [
    0x07, 0x0E, 0x03, 0xA1, 0x00, 0xF8, 0x01, 0x18, 0x00, 0x20, 0x60, 0x60, 0x00, 0x00, 0x3F, 0x01,
];

/// Offset of the power (DAC high) byte inside [`CALIBRATION_TEMPLATE`].
pub const CALIBRATION_POWER_OFFSET: usize = 12;

/// Power levels swept during calibration, in transmission order.
pub const CALIBRATION_POWER_LEVELS: [u8; 8] = [0x00, 0xFC, 0x7C, 0x3C, 0x5C, 0x6C, 0x74, 0x70];

/// Calibration response length in bytes.
pub const CALIBRATION_RESPONSE_LEN: usize = 3;

/// Index of the outcome byte inside the calibration response.
pub const CALIBRATION_OUTCOME_INDEX: usize = 2;

/// Calibration outcome: the tag detector woke up.
pub const CALIBRATION_TAG_DETECTED: u8 = 0x02;

/// Calibration outcome: the idle period expired without a wake-up.
pub const CALIBRATION_TIMEOUT: u8 = 0x01;

// ============================================================================
// Protocol Select
// ============================================================================

/// Protocol select frame (ISO/IEC 14443-A, default parameters).
pub const PROTOCOL_SELECT_COMMAND: [u8; 4] = [0x02, 0x02, 0x02, 0x00];

/// Protocol select response length in bytes.
pub const PROTOCOL_SELECT_RESPONSE_LEN: usize = 2;

/// Protocol select result code: protocol accepted.
pub const PROTOCOL_SELECT_OK: u8 = 0x00;

/// Protocol select result code: invalid command length.
pub const PROTOCOL_SELECT_INVALID_LENGTH: u8 = 0x82;

/// Protocol select result code: invalid protocol.
pub const PROTOCOL_SELECT_INVALID_PROTOCOL: u8 = 0x83;

// ============================================================================
// Tag Detect
// ============================================================================

/// Tag detect frame (`SendRecv` of a 7-bit REQA).
pub const TAG_DETECT_COMMAND: [u8; 4] = [0x04, 0x02, 0x26, 0x07];

/// Tag detect response length in bytes.
pub const TAG_DETECT_RESPONSE_LEN: usize = 2;

/// Tag detect result code: a frame was received from a tag.
pub const TAG_DETECT_FRAME_OK: u8 = 0x80;

/// Tag detect result code: no tag answered.
pub const TAG_DETECT_NO_FRAME: u8 = 0x87;

// ============================================================================
// Status Bus Patterns
// ============================================================================

/// All lines off.
pub const PATTERN_OFF: u8 = 0x00;

/// Rendered while the handshake waits for the echo.
pub const PATTERN_HANDSHAKE_WAIT: u8 = 0x0F;

/// Rendered once the handshake read resolves.
pub const PATTERN_HANDSHAKE_DONE: u8 = 0xF0;

/// Calibration: tag detected (lower nibble).
pub const PATTERN_CALIBRATION_DETECTED: u8 = 0x0F;

/// Calibration: timeout (upper nibble).
pub const PATTERN_CALIBRATION_TIMEOUT: u8 = 0xF0;

/// Generic error pattern (all lines on).
pub const PATTERN_ERROR: u8 = 0xFF;

/// Protocol select: success.
pub const PATTERN_SELECT_OK: u8 = 0x03;

/// Protocol select: known error code.
pub const PATTERN_SELECT_ERROR: u8 = 0xC0;

/// Tag poll: tag detected.
pub const PATTERN_TAG_DETECTED: u8 = 0x0A;

/// Tag poll: no tag.
pub const PATTERN_TAG_ABSENT: u8 = 0xA0;

/// Tag poll: unexpected response.
pub const PATTERN_TAG_UNEXPECTED: u8 = 0xAA;

/// Terminal idle pattern, held until an external reset.
pub const PATTERN_IDLE: u8 = 0x07;

// ============================================================================
// Timing Defaults
// ============================================================================

/// Default timeout window period (milliseconds).
///
/// # Value: 105ms
///
/// 16-bit timer, 1:4 prescaler on a 2.5 MHz instruction clock:
/// 65 536 ticks of 1.6 µs each.
pub const DEFAULT_TIMEOUT_WINDOW_MS: u64 = 105;

/// Delay between handshake attempts (milliseconds).
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 70;

/// Hold time for each rendered identity byte (milliseconds).
pub const DEFAULT_IDENTITY_HOLD_MS: u64 = 70;

/// Hold time for each calibration outcome (milliseconds).
pub const DEFAULT_CALIBRATION_HOLD_MS: u64 = 500;

/// Hold time for protocol select and tag poll outcomes (milliseconds).
pub const DEFAULT_RESULT_HOLD_MS: u64 = 1000;

/// Actuator pulse width for opening the door (microseconds).
pub const DEFAULT_OPEN_PULSE_US: u64 = 2000;

/// Actuator pulse width for closing the door (microseconds).
pub const DEFAULT_CLOSE_PULSE_US: u64 = 1000;

// ============================================================================
// Serial Link
// ============================================================================

/// Nominal serial link speed in bits per second.
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

/// Reference oscillator frequency the baud divisor is derived from.
pub const REFERENCE_CLOCK_HZ: u32 = 10_000_000;

/// Baud rate generator divisor for [`DEFAULT_BAUD_RATE`] at
/// [`REFERENCE_CLOCK_HZ`].
pub const BAUD_DIVISOR: u16 = 42;

/// Actual baud rate produced by the 16-bit high-speed baud generator.
///
/// # Examples
///
/// ```
/// use rfidlock_core::constants::{BAUD_DIVISOR, REFERENCE_CLOCK_HZ, baud_rate};
///
/// // 10 MHz / (4 * 43) = 58 139 baud, within 1% of 57 600
/// assert_eq!(baud_rate(REFERENCE_CLOCK_HZ, BAUD_DIVISOR), 58_139);
/// ```
pub const fn baud_rate(clock_hz: u32, divisor: u16) -> u32 {
    clock_hz / (4 * (divisor as u32 + 1))
}
