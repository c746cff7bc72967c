use bytes::{Bytes, BytesMut};
use rfidlock_core::{Error, Result};
use std::fmt;

/// CommandFrame is the byte-level wire format of one outbound command.
///
/// A frame is an ordered, fixed-length byte sequence. It is immutable once
/// built; patching a field (such as the calibration power byte) produces a
/// new frame and leaves the original untouched.
///
/// # Wire Format
///
/// ```text
/// 02 02 02 00
/// ^^ ^^ ^^^^^
/// |  |  Data (LEN bytes)
/// |  LEN
/// CMD
/// ```
///
/// The echo command is the only exception: a single `0x55` byte with no
/// length field.
///
/// # Basic Usage
///
/// ```
/// use rfidlock_protocol::CommandFrame;
///
/// let frame = CommandFrame::from_static(&[0x02, 0x02, 0x02, 0x00]);
/// assert_eq!(frame.len(), 4);
/// assert_eq!(frame.code(), Some(0x02));
///
/// let patched = frame.with_byte(3, 0x01).unwrap();
/// assert_eq!(patched.as_bytes(), &[0x02, 0x02, 0x02, 0x01]);
/// assert_eq!(frame.as_bytes(), &[0x02, 0x02, 0x02, 0x00]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandFrame {
    /// Raw bytes in transmission order
    data: Bytes,
}

impl CommandFrame {
    /// Create a frame from owned bytes.
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }

    /// Create a frame from a static byte table without copying.
    pub fn from_static(bytes: &'static [u8]) -> Self {
        Self::new(Bytes::from_static(bytes))
    }

    /// Create a frame by copying a byte slice.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(bytes))
    }

    /// Get the raw bytes of the frame in transmission order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get the frame size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the frame carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Command code (first byte), if any.
    pub fn code(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// Byte at `offset`, if in range.
    pub fn byte(&self, offset: usize) -> Option<u8> {
        self.data.get(offset).copied()
    }

    /// Build a new frame with the byte at `offset` replaced by `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOutOfRange`] if `offset` is past the end of
    /// the frame. The frame length never changes.
    pub fn with_byte(&self, offset: usize, value: u8) -> Result<Self> {
        if offset >= self.data.len() {
            return Err(Error::FieldOutOfRange {
                offset,
                len: self.data.len(),
            });
        }

        let mut buf = BytesMut::from(&self.data[..]);
        buf[offset] = value;

        Ok(Self::new(buf.freeze()))
    }
}

impl AsRef<[u8]> for CommandFrame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<&'static [u8]> for CommandFrame {
    fn from(bytes: &'static [u8]) -> Self {
        Self::from_static(bytes)
    }
}

impl fmt::Display for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfidlock_core::constants::CALIBRATION_TEMPLATE;

    #[test]
    fn test_frame_display_hex() {
        let frame = CommandFrame::from_static(&[0x04, 0x02, 0x26, 0x07]);
        assert_eq!(frame.to_string(), "04 02 26 07");
    }

    #[test]
    fn test_with_byte_keeps_length() {
        let frame = CommandFrame::from_static(&CALIBRATION_TEMPLATE);
        let patched = frame.with_byte(12, 0xFC).unwrap();

        assert_eq!(patched.len(), frame.len());
        assert_eq!(patched.byte(12), Some(0xFC));
        assert_eq!(frame.byte(12), Some(0x00));
        for offset in (0..frame.len()).filter(|o| *o != 12) {
            assert_eq!(patched.byte(offset), frame.byte(offset));
        }
    }

    #[test]
    fn test_with_byte_out_of_range() {
        let frame = CommandFrame::from_static(&[0x01, 0x00]);
        let result = frame.with_byte(2, 0xFF);
        assert!(matches!(
            result,
            Err(Error::FieldOutOfRange { offset: 2, len: 2 })
        ));
    }

    #[test]
    fn test_empty_frame() {
        let frame = CommandFrame::from_static(&[]);
        assert!(frame.is_empty());
        assert_eq!(frame.code(), None);
    }
}
