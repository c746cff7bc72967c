//! Response frames returned by the reader.
//!
//! Every response except identity has a length fixed by its command; those
//! are built on [`FixedResponse<N>`] so a read can never consume more
//! bytes than the contract allows. Identity responses declare their payload
//! length in a header byte; [`IdentityResponse`] stores at most its
//! capacity and reports anything beyond it as a malformed length.

use rfidlock_core::{
    CalibrationOutcome, Error, Fault, Result, SelectOutcome, TagPollOutcome, constants::*,
};
use serde::{Deserialize, Serialize};

/// A response of exactly `N` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedResponse<const N: usize> {
    bytes: [u8; N],
}

/// Calibration response (`00 01 <outcome>`).
pub type CalibrationResponse = FixedResponse<CALIBRATION_RESPONSE_LEN>;

impl<const N: usize> FixedResponse<N> {
    /// Wrap an already-read response.
    pub const fn new(bytes: [u8; N]) -> Self {
        Self { bytes }
    }

    /// Build a response from a slice of exactly `N` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShortResponse`] if the slice length differs from `N`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; N] = bytes.try_into().map_err(|_| Error::ShortResponse {
            expected: N,
            actual: bytes.len(),
        })?;
        Ok(Self { bytes })
    }

    /// Expected length in bytes.
    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Raw response bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte at `index`, if in range.
    pub fn byte(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }
}

impl CalibrationResponse {
    /// Classify the outcome byte.
    pub fn outcome(&self) -> CalibrationOutcome {
        CalibrationOutcome::classify(self.bytes[CALIBRATION_OUTCOME_INDEX])
    }
}

/// Protocol select response (`<code> 00`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectResponse(FixedResponse<PROTOCOL_SELECT_RESPONSE_LEN>);

impl SelectResponse {
    pub const fn new(bytes: [u8; PROTOCOL_SELECT_RESPONSE_LEN]) -> Self {
        Self(FixedResponse::new(bytes))
    }

    /// # Errors
    ///
    /// Returns [`Error::ShortResponse`] on a length mismatch.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        FixedResponse::from_slice(bytes).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Classify the result code (byte 0).
    ///
    /// # Examples
    ///
    /// ```
    /// use rfidlock_core::SelectOutcome;
    /// use rfidlock_protocol::SelectResponse;
    ///
    /// let response = SelectResponse::new([0x82, 0x00]);
    /// assert_eq!(response.outcome(), SelectOutcome::KnownError(0x82));
    /// ```
    pub fn outcome(&self) -> SelectOutcome {
        SelectOutcome::classify(self.0.bytes[0])
    }
}

/// Tag detect response (`<code> <len>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagPollResponse(FixedResponse<TAG_DETECT_RESPONSE_LEN>);

impl TagPollResponse {
    pub const fn new(bytes: [u8; TAG_DETECT_RESPONSE_LEN]) -> Self {
        Self(FixedResponse::new(bytes))
    }

    /// # Errors
    ///
    /// Returns [`Error::ShortResponse`] on a length mismatch.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        FixedResponse::from_slice(bytes).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Classify the result code (byte 0).
    pub fn outcome(&self) -> TagPollOutcome {
        TagPollOutcome::classify(self.0.bytes[0])
    }
}

/// Identity response with a capacity-bounded payload.
///
/// Bytes are pushed as they arrive from the link. Only the first
/// `capacity` bytes are stored; the rest are counted so the caller can
/// drain the declared length without overrunning the buffer.
///
/// # Examples
///
/// ```
/// use rfidlock_protocol::IdentityResponse;
///
/// let mut identity = IdentityResponse::new(0x00, 20, 16);
/// for byte in 0..20u8 {
///     identity.push(byte);
/// }
///
/// assert!(identity.is_complete());
/// assert!(identity.is_truncated());
/// assert_eq!(identity.payload().len(), 16);
/// assert_eq!(identity.discarded(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityResponse {
    /// Status code from the response header
    status: u8,

    /// Payload length declared by the reader
    declared: usize,

    /// Maximum number of payload bytes stored
    capacity: usize,

    /// Stored payload (never longer than `capacity`)
    payload: Vec<u8>,

    /// Bytes received beyond `capacity`
    discarded: usize,
}

impl IdentityResponse {
    /// Start an identity response from its two header bytes.
    pub fn new(status: u8, declared: usize, capacity: usize) -> Self {
        Self {
            status,
            declared,
            capacity,
            payload: Vec::with_capacity(declared.min(capacity)),
            discarded: 0,
        }
    }

    /// Start an identity response with the default capacity.
    pub fn with_default_capacity(status: u8, declared: usize) -> Self {
        Self::new(status, declared, IDENTITY_CAPACITY)
    }

    /// Record one payload byte.
    ///
    /// Returns `true` if the byte was stored, `false` if it was past the
    /// capacity and discarded.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.payload.len() < self.capacity {
            self.payload.push(byte);
            true
        } else {
            self.discarded += 1;
            false
        }
    }

    /// Number of payload bytes still expected from the link.
    pub fn remaining(&self) -> usize {
        self.declared
            .saturating_sub(self.payload.len() + self.discarded)
    }

    /// Whether every declared byte has been received.
    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// Whether the declared length exceeds the capacity.
    pub fn is_truncated(&self) -> bool {
        self.declared > self.capacity
    }

    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn declared(&self) -> usize {
        self.declared
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Number of bytes received and dropped past the capacity.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Payload as text, with non-printable bytes replaced by `.`.
    ///
    /// Reader identities are ASCII strings terminated by a CRC; the CRC
    /// bytes show up as dots.
    pub fn display_text(&self) -> String {
        self.payload
            .iter()
            .map(|b| {
                if b.is_ascii_graphic() || *b == b' ' {
                    *b as char
                } else {
                    '.'
                }
            })
            .collect()
    }

    /// Malformed-length fault when the declaration exceeded the capacity.
    pub fn fault(&self) -> Option<Fault> {
        self.is_truncated().then_some(Fault::MalformedLength {
            declared: self.declared,
            capacity: self.capacity,
        })
    }
}
