//! Timeout-aware serial link to the reader.
//!
//! [`SerialLink`] owns a [`SerialTransport`] and the [`TimeoutWindow`]
//! that bounds its timeout reads. Everything above this layer talks to the
//! reader through `write_byte`, `send_frame`, `read_byte` and
//! `read_byte_or_timeout`.
//!
//! # Timeout Reads
//!
//! `read_byte_or_timeout` races the transport against the timeout flag.
//! When both are ready at the same poll the byte wins. A timeout clears the
//! flag and yields [`TIMEOUT_SENTINEL`]; callers cannot tell it apart from a
//! received `0x0F`, and the bring-up sequence never expects one there.

use crate::error::Result;
use crate::timeout::{TimeoutFlag, TimeoutWindow};
use crate::traits::SerialTransport;
use crate::types::LinkSettings;
use rfidlock_core::constants::TIMEOUT_SENTINEL;
use rfidlock_protocol::CommandFrame;
use tracing::{debug, trace};

/// Serial link with a timeout-augmented read primitive.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use rfidlock_hardware::link::SerialLink;
/// use rfidlock_hardware::mock::MockTransport;
/// use rfidlock_hardware::timeout::{Cadence, TimeoutWindow};
/// use rfidlock_hardware::types::LinkSettings;
///
/// #[tokio::main]
/// async fn main() -> rfidlock_hardware::Result<()> {
///     let (transport, handle) = MockTransport::new();
///     let window = TimeoutWindow::new(Duration::from_millis(105), Cadence::PerRead);
///     let mut link = SerialLink::new(transport, window);
///
///     link.init(&LinkSettings::default()).await?;
///     link.arm_timeout();
///
///     handle.push_bytes(&[0x55])?;
///     link.write_byte(0x55).await?;
///     assert_eq!(link.read_byte_or_timeout().await?, 0x55);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct SerialLink<T> {
    transport: T,
    window: TimeoutWindow,

    /// Consumer side of the window's flag
    flag: TimeoutFlag,
}

impl<T: SerialTransport> SerialLink<T> {
    pub fn new(transport: T, window: TimeoutWindow) -> Self {
        let flag = window.flag();
        Self {
            transport,
            window,
            flag,
        }
    }

    /// Configure the transport for continuous receive. Called once at
    /// startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the settings.
    pub async fn init(&mut self, settings: &LinkSettings) -> Result<()> {
        self.transport.configure(settings).await?;
        debug!(
            "Serial link up on {} ({})",
            self.transport.info().name,
            settings
        );
        Ok(())
    }

    /// Enable the timeout window.
    pub fn arm_timeout(&mut self) {
        self.window.arm();
    }

    /// Transmit one byte.
    pub async fn write_byte(&mut self, byte: u8) -> Result<()> {
        trace!("TX {:02X}", byte);
        self.transport.write_byte(byte).await
    }

    /// Transmit a frame byte by byte, in order.
    pub async fn send_frame(&mut self, frame: &CommandFrame) -> Result<()> {
        trace!("TX frame {}", frame);
        for byte in frame.as_bytes() {
            self.transport.write_byte(*byte).await?;
        }
        Ok(())
    }

    /// Wait for the next byte with no time bound.
    pub async fn read_byte(&mut self) -> Result<u8> {
        let byte = self.transport.read_byte().await?;
        trace!("RX {:02X}", byte);
        Ok(byte)
    }

    /// Wait for the next byte or the timeout window, whichever comes first.
    ///
    /// Returns the byte if data arrived first, leaving the flag untouched.
    /// Returns [`TIMEOUT_SENTINEL`] if the window expired first, clearing
    /// the flag.
    pub async fn read_byte_or_timeout(&mut self) -> Result<u8> {
        self.window.begin_read();

        let received = tokio::select! {
            biased;
            byte = self.transport.read_byte() => Some(byte),
            _ = self.flag.raised() => None,
        };

        match received {
            Some(byte) => {
                self.window.end_read();
                let byte = byte?;
                trace!("RX {:02X}", byte);
                Ok(byte)
            }
            None => {
                self.flag.take();
                trace!("RX timeout");
                Ok(TIMEOUT_SENTINEL)
            }
        }
    }

    /// Drop any received bytes not yet read.
    ///
    /// Returns the number of bytes dropped.
    pub async fn discard_input(&mut self) -> Result<usize> {
        let dropped = self.transport.discard_input().await?;
        if dropped > 0 {
            debug!("Discarded {} stale byte(s)", dropped);
        }
        Ok(dropped)
    }

    /// Read exactly `N` bytes with no time bound.
    pub async fn read_exact<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        for slot in bytes.iter_mut() {
            *slot = self.read_byte().await?;
        }
        Ok(bytes)
    }

    /// Another handle to the timeout flag.
    pub fn timeout_flag(&self) -> TimeoutFlag {
        self.flag.clone()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Release the transport. The timeout window is stopped.
    pub fn into_inner(mut self) -> T {
        self.window.disarm();
        self.transport
    }
}
