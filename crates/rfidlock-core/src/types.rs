use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bit pattern rendered on the 8-line status bus.
///
/// Bit 7 is the leftmost line when displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StatusPattern(u8);

impl StatusPattern {
    pub const OFF: Self = Self(PATTERN_OFF);
    pub const HANDSHAKE_WAIT: Self = Self(PATTERN_HANDSHAKE_WAIT);
    pub const HANDSHAKE_DONE: Self = Self(PATTERN_HANDSHAKE_DONE);
    pub const ERROR: Self = Self(PATTERN_ERROR);
    pub const IDLE: Self = Self(PATTERN_IDLE);

    /// Create a pattern from raw line levels.
    #[must_use]
    pub const fn new(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw line levels.
    #[must_use]
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Check whether a single line (0-7) is driven high.
    #[must_use]
    pub const fn is_lit(&self, line: u8) -> bool {
        line < 8 && self.0 & (1 << line) != 0
    }
}

impl From<u8> for StatusPattern {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl fmt::Display for StatusPattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:08b}", self.0)
    }
}

/// Failure classification reported through the status bus.
///
/// Faults never stop the bring-up sequence; they are rendered at the point
/// of detection and recorded in the step report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Fault {
    /// No response within the timeout window.
    Timeout,

    /// The reader returned a recognized error code.
    ProtocolError { code: u8 },

    /// The response code is outside the known set.
    UnexpectedResponse { code: u8 },

    /// Declared identity payload length exceeds the buffer capacity.
    MalformedLength { declared: usize, capacity: usize },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Fault::Timeout => write!(f, "timeout"),
            Fault::ProtocolError { code } => write!(f, "protocol error 0x{code:02X}"),
            Fault::UnexpectedResponse { code } => write!(f, "unexpected response 0x{code:02X}"),
            Fault::MalformedLength { declared, capacity } => {
                write!(f, "declared length {declared} exceeds capacity {capacity}")
            }
        }
    }
}

/// Classified result of one calibration power level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationOutcome {
    /// The tag detector woke up at this power level.
    TagDetected,

    /// The detector timed out at this power level.
    Timeout,

    /// Any other outcome byte.
    Unexpected(u8),
}

impl CalibrationOutcome {
    /// Classify the outcome byte (byte 2 of the calibration response).
    ///
    /// # Examples
    ///
    /// ```
    /// use rfidlock_core::CalibrationOutcome;
    ///
    /// assert_eq!(CalibrationOutcome::classify(0x02), CalibrationOutcome::TagDetected);
    /// assert_eq!(CalibrationOutcome::classify(0x01), CalibrationOutcome::Timeout);
    /// assert_eq!(CalibrationOutcome::classify(0x05), CalibrationOutcome::Unexpected(0x05));
    /// ```
    #[must_use]
    pub fn classify(code: u8) -> Self {
        match code {
            CALIBRATION_TAG_DETECTED => Self::TagDetected,
            CALIBRATION_TIMEOUT => Self::Timeout,
            other => Self::Unexpected(other),
        }
    }

    /// Pattern rendered for this outcome.
    #[must_use]
    pub fn pattern(&self) -> StatusPattern {
        match self {
            Self::TagDetected => StatusPattern::new(PATTERN_CALIBRATION_DETECTED),
            Self::Timeout => StatusPattern::new(PATTERN_CALIBRATION_TIMEOUT),
            Self::Unexpected(_) => StatusPattern::ERROR,
        }
    }

    /// Fault carried by this outcome, if any.
    ///
    /// A detector timeout is a regular calibration result, not a fault.
    #[must_use]
    pub fn fault(&self) -> Option<Fault> {
        match self {
            Self::Unexpected(code) => Some(Fault::UnexpectedResponse { code: *code }),
            _ => None,
        }
    }
}

impl fmt::Display for CalibrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TagDetected => write!(f, "tag detected"),
            Self::Timeout => write!(f, "timeout"),
            Self::Unexpected(code) => write!(f, "unexpected 0x{code:02X}"),
        }
    }
}

/// Classified protocol select result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectOutcome {
    Success,

    /// The reader rejected the request with a documented error code.
    KnownError(u8),

    Unexpected(u8),
}

impl SelectOutcome {
    /// Classify the result code (byte 0 of the response).
    ///
    /// # Examples
    ///
    /// ```
    /// use rfidlock_core::SelectOutcome;
    ///
    /// assert_eq!(SelectOutcome::classify(0x00), SelectOutcome::Success);
    /// assert_eq!(SelectOutcome::classify(0x82), SelectOutcome::KnownError(0x82));
    /// assert_eq!(SelectOutcome::classify(0x10), SelectOutcome::Unexpected(0x10));
    /// ```
    #[must_use]
    pub fn classify(code: u8) -> Self {
        match code {
            PROTOCOL_SELECT_OK => Self::Success,
            PROTOCOL_SELECT_INVALID_LENGTH | PROTOCOL_SELECT_INVALID_PROTOCOL => {
                Self::KnownError(code)
            }
            other => Self::Unexpected(other),
        }
    }

    #[must_use]
    pub fn pattern(&self) -> StatusPattern {
        match self {
            Self::Success => StatusPattern::new(PATTERN_SELECT_OK),
            Self::KnownError(_) => StatusPattern::new(PATTERN_SELECT_ERROR),
            Self::Unexpected(_) => StatusPattern::ERROR,
        }
    }

    #[must_use]
    pub fn fault(&self) -> Option<Fault> {
        match self {
            Self::Success => None,
            Self::KnownError(code) => Some(Fault::ProtocolError { code: *code }),
            Self::Unexpected(code) => Some(Fault::UnexpectedResponse { code: *code }),
        }
    }
}

impl fmt::Display for SelectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::KnownError(code) => write!(f, "error 0x{code:02X}"),
            Self::Unexpected(code) => write!(f, "unexpected 0x{code:02X}"),
        }
    }
}

/// Classified tag poll result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagPollOutcome {
    Detected,
    NotDetected,
    Unexpected(u8),
}

impl TagPollOutcome {
    /// Classify the result code (byte 0 of the response).
    ///
    /// # Examples
    ///
    /// ```
    /// use rfidlock_core::TagPollOutcome;
    ///
    /// assert_eq!(TagPollOutcome::classify(0x80), TagPollOutcome::Detected);
    /// assert_eq!(TagPollOutcome::classify(0x87), TagPollOutcome::NotDetected);
    /// ```
    #[must_use]
    pub fn classify(code: u8) -> Self {
        match code {
            TAG_DETECT_FRAME_OK => Self::Detected,
            TAG_DETECT_NO_FRAME => Self::NotDetected,
            other => Self::Unexpected(other),
        }
    }

    #[must_use]
    pub fn pattern(&self) -> StatusPattern {
        match self {
            Self::Detected => StatusPattern::new(PATTERN_TAG_DETECTED),
            Self::NotDetected => StatusPattern::new(PATTERN_TAG_ABSENT),
            Self::Unexpected(_) => StatusPattern::new(PATTERN_TAG_UNEXPECTED),
        }
    }

    /// No tag in the field is a normal poll result, not a fault.
    #[must_use]
    pub fn fault(&self) -> Option<Fault> {
        match self {
            Self::Unexpected(code) => Some(Fault::UnexpectedResponse { code: *code }),
            _ => None,
        }
    }
}

impl fmt::Display for TagPollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Detected => write!(f, "tag detected"),
            Self::NotDetected => write!(f, "no tag"),
            Self::Unexpected(code) => write!(f, "unexpected 0x{code:02X}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0x02, CalibrationOutcome::TagDetected, 0x0F)]
    #[case(0x01, CalibrationOutcome::Timeout, 0xF0)]
    #[case(0x00, CalibrationOutcome::Unexpected(0x00), 0xFF)]
    #[case(0x05, CalibrationOutcome::Unexpected(0x05), 0xFF)]
    fn test_calibration_classification(
        #[case] code: u8,
        #[case] expected: CalibrationOutcome,
        #[case] pattern: u8,
    ) {
        let outcome = CalibrationOutcome::classify(code);
        assert_eq!(outcome, expected);
        assert_eq!(outcome.pattern().bits(), pattern);
    }

    #[rstest]
    #[case(0x00, SelectOutcome::Success, 0x03)]
    #[case(0x82, SelectOutcome::KnownError(0x82), 0xC0)]
    #[case(0x83, SelectOutcome::KnownError(0x83), 0xC0)]
    #[case(0x81, SelectOutcome::Unexpected(0x81), 0xFF)]
    #[case(0xFF, SelectOutcome::Unexpected(0xFF), 0xFF)]
    fn test_select_classification(
        #[case] code: u8,
        #[case] expected: SelectOutcome,
        #[case] pattern: u8,
    ) {
        let outcome = SelectOutcome::classify(code);
        assert_eq!(outcome, expected);
        assert_eq!(outcome.pattern().bits(), pattern);
    }

    #[rstest]
    #[case(0x80, TagPollOutcome::Detected, 0x0A)]
    #[case(0x87, TagPollOutcome::NotDetected, 0xA0)]
    #[case(0x86, TagPollOutcome::Unexpected(0x86), 0xAA)]
    #[case(0x00, TagPollOutcome::Unexpected(0x00), 0xAA)]
    fn test_tag_poll_classification(
        #[case] code: u8,
        #[case] expected: TagPollOutcome,
        #[case] pattern: u8,
    ) {
        let outcome = TagPollOutcome::classify(code);
        assert_eq!(outcome, expected);
        assert_eq!(outcome.pattern().bits(), pattern);
    }

    #[test]
    fn test_classification_is_total() {
        for code in 0..=u8::MAX {
            match SelectOutcome::classify(code) {
                SelectOutcome::Success => assert_eq!(code, 0x00),
                SelectOutcome::KnownError(c) => assert!(c == 0x82 || c == 0x83),
                SelectOutcome::Unexpected(c) => assert_eq!(c, code),
            }
            match TagPollOutcome::classify(code) {
                TagPollOutcome::Detected => assert_eq!(code, 0x80),
                TagPollOutcome::NotDetected => assert_eq!(code, 0x87),
                TagPollOutcome::Unexpected(c) => assert_eq!(c, code),
            }
        }
    }

    #[test]
    fn test_faults() {
        assert_eq!(SelectOutcome::Success.fault(), None);
        assert_eq!(
            SelectOutcome::KnownError(0x82).fault(),
            Some(Fault::ProtocolError { code: 0x82 })
        );
        assert_eq!(TagPollOutcome::NotDetected.fault(), None);
        assert_eq!(CalibrationOutcome::Timeout.fault(), None);
        assert_eq!(
            CalibrationOutcome::Unexpected(0x05).fault(),
            Some(Fault::UnexpectedResponse { code: 0x05 })
        );
    }

    #[test]
    fn test_status_pattern_bits() {
        let pattern = StatusPattern::new(0x0A);
        assert!(pattern.is_lit(1));
        assert!(pattern.is_lit(3));
        assert!(!pattern.is_lit(0));
        assert!(!pattern.is_lit(8));
        assert_eq!(pattern.to_string(), "00001010");
    }

    #[test]
    fn test_fault_serialization() {
        let fault = Fault::MalformedLength {
            declared: 20,
            capacity: 16,
        };
        let json = serde_json::to_string(&fault).unwrap();
        assert_eq!(json, r#"{"kind":"malformed_length","declared":20,"capacity":16}"#);
        assert_eq!(
            fault.to_string(),
            "declared length 20 exceeds capacity 16"
        );
    }
}
