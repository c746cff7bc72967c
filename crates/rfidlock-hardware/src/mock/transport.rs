//! Mock serial transport for testing and development.
//!
//! The transport records every byte written and hands back whatever bytes
//! the test pushes through its handle. It has no notion of the reader
//! protocol; use [`SimulatedReader`](super::SimulatedReader) for that.

use crate::{
    HardwareError, Result,
    traits::SerialTransport,
    types::{DeviceInfo, LinkSettings},
};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// Mock byte transport.
///
/// # Examples
///
/// ```
/// use rfidlock_hardware::mock::MockTransport;
/// use rfidlock_hardware::traits::SerialTransport;
///
/// #[tokio::main]
/// async fn main() -> rfidlock_hardware::Result<()> {
///     let (mut transport, handle) = MockTransport::new();
///
///     handle.push_bytes(&[0x55])?;
///     transport.write_byte(0x55).await?;
///
///     assert_eq!(transport.read_byte().await?, 0x55);
///     assert_eq!(handle.sent(), vec![0x55]);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    /// Bytes queued by the handle
    rx: mpsc::UnboundedReceiver<u8>,

    /// Every byte written, in order
    sent: Arc<Mutex<Vec<u8>>>,

    /// Last settings passed to `configure`
    settings: Arc<Mutex<Option<LinkSettings>>>,

    /// Device name
    name: String,
}

impl MockTransport {
    /// Create a new mock transport with the default name.
    ///
    /// Returns the transport and a handle that feeds received bytes and
    /// inspects written ones.
    pub fn new() -> (Self, MockTransportHandle) {
        Self::with_name("Mock Transport")
    }

    /// Create a new mock transport with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockTransportHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let settings = Arc::new(Mutex::new(None));

        let transport = Self {
            rx,
            sent: Arc::clone(&sent),
            settings: Arc::clone(&settings),
            name: name.into(),
        };

        let handle = MockTransportHandle { tx, sent, settings };

        (transport, handle)
    }
}

impl SerialTransport for MockTransport {
    async fn configure(&mut self, settings: &LinkSettings) -> Result<()> {
        *self
            .settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(*settings);
        Ok(())
    }

    async fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(byte);
        Ok(())
    }

    async fn read_byte(&mut self) -> Result<u8> {
        // UnboundedReceiver::recv is cancel safe
        self.rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(self.name.clone()))
    }

    async fn discard_input(&mut self) -> Result<usize> {
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        Ok(dropped)
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.name.clone(), "Mock Transport v1.0")
    }
}

/// Handle for driving a [`MockTransport`].
///
/// Dropping every handle closes the receive side; the transport then
/// reports [`HardwareError::Disconnected`] once queued bytes are consumed.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    tx: mpsc::UnboundedSender<u8>,
    sent: Arc<Mutex<Vec<u8>>>,
    settings: Arc<Mutex<Option<LinkSettings>>>,
}

impl MockTransportHandle {
    /// Queue bytes for the transport to receive.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport has been dropped.
    pub fn push_bytes(&self, bytes: &[u8]) -> Result<()> {
        for byte in bytes {
            self.tx
                .send(*byte)
                .map_err(|_| HardwareError::disconnected("Mock transport dropped"))?;
        }
        Ok(())
    }

    /// Bytes written so far.
    pub fn sent(&self) -> Vec<u8> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Take and clear the bytes written so far.
    pub fn take_sent(&self) -> Vec<u8> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Settings applied by the last `configure` call, if any.
    pub fn settings(&self) -> Option<LinkSettings> {
        *self
            .settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
