//! Hardware collaborator trait definitions.
//!
//! The bring-up sequence only ever touches the hardware through these three
//! narrow interfaces: a byte-level serial transport, an 8-line status bus,
//! and a single actuator control line. Pin assignment, clock setup and
//! interrupt wiring live behind the implementations.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{DeviceInfo, LineLevel, LinkSettings};
use rfidlock_core::StatusPattern;

/// Byte-level serial transport to the reader module.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic type parameters, or the enum wrapper
/// [`AnyTransport`](crate::devices::AnyTransport) when the transport is
/// chosen at runtime.
///
/// # Cancel Safety
///
/// [`read_byte`](SerialTransport::read_byte) is raced against the timeout
/// window by [`SerialLink::read_byte_or_timeout`]. Implementations must be
/// cancel safe: dropping the future before it completes must not lose a
/// received byte.
///
/// [`SerialLink::read_byte_or_timeout`]: crate::link::SerialLink::read_byte_or_timeout
///
/// # Examples
///
/// ```no_run
/// use rfidlock_hardware::traits::SerialTransport;
/// use rfidlock_hardware::error::Result;
///
/// async fn echo<T: SerialTransport>(transport: &mut T) -> Result<bool> {
///     transport.write_byte(0x55).await?;
///     Ok(transport.read_byte().await? == 0x55)
/// }
/// ```
pub trait SerialTransport: Send {
    /// Apply serial framing and speed, enabling transmit and continuous
    /// receive.
    ///
    /// # Errors
    ///
    /// Returns an error if the port rejects the settings.
    async fn configure(&mut self, settings: &LinkSettings) -> Result<()>;

    /// Wait until the transmitter accepts a byte, then send `byte`.
    ///
    /// Bytes are transmitted in call order.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected or the write fails.
    async fn write_byte(&mut self, byte: u8) -> Result<()>;

    /// Wait for the next received byte. The wait is unbounded.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected or the read fails.
    async fn read_byte(&mut self) -> Result<u8>;

    /// Drop every byte already received and not yet read.
    ///
    /// Returns the number of bytes dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the receive buffer cannot be cleared.
    async fn discard_input(&mut self) -> Result<usize>;

    /// Get transport information.
    fn info(&self) -> DeviceInfo;
}

/// Eight-line parallel status bus used as a human-visible indicator.
///
/// # Examples
///
/// ```no_run
/// use rfidlock_core::StatusPattern;
/// use rfidlock_hardware::traits::StatusOutput;
/// use rfidlock_hardware::error::Result;
///
/// async fn blank<S: StatusOutput>(bus: &mut S) -> Result<()> {
///     bus.render(StatusPattern::OFF).await
/// }
/// ```
pub trait StatusOutput: Send {
    /// Drive the bus lines to `pattern`. The pattern stays displayed until
    /// the next call.
    ///
    /// # Errors
    ///
    /// Returns an error if the output device fails.
    async fn render(&mut self, pattern: StatusPattern) -> Result<()>;
}

/// Single control line driving the door actuator.
pub trait ControlLine: Send {
    /// Drive the line to `level`.
    ///
    /// # Errors
    ///
    /// Returns an error if the output device fails.
    async fn set_level(&mut self, level: LineLevel) -> Result<()>;
}
