//! Enum wrapper for transport dispatch.
//!
//! Native `async fn` in traits is not object-safe, so the driver cannot
//! hold a `Box<dyn SerialTransport>`. [`AnyTransport`] provides the same
//! runtime choice with static dispatch, and lets the physical port drop
//! out entirely when the `hardware-serial` feature is off.
//!
//! # Examples
//!
//! ```
//! use rfidlock_hardware::devices::AnyTransport;
//! use rfidlock_hardware::mock::SimulatedReader;
//!
//! let transport = AnyTransport::Simulated(SimulatedReader::default());
//! ```

use crate::mock::{MockTransport, SimulatedReader};
#[cfg(feature = "hardware-serial")]
use crate::serial::SerialPortTransport;
use crate::traits::SerialTransport;
use crate::{DeviceInfo, LinkSettings, Result};

/// Any transport the bring-up sequence can run over.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTransport {
    /// Scripted transport for tests.
    Mock(MockTransport),

    /// In-process reader simulation.
    Simulated(SimulatedReader),

    /// Physical serial port.
    #[cfg(feature = "hardware-serial")]
    Serial(SerialPortTransport),
}

impl SerialTransport for AnyTransport {
    async fn configure(&mut self, settings: &LinkSettings) -> Result<()> {
        match self {
            Self::Mock(device) => device.configure(settings).await,
            Self::Simulated(device) => device.configure(settings).await,
            #[cfg(feature = "hardware-serial")]
            Self::Serial(device) => device.configure(settings).await,
        }
    }

    async fn write_byte(&mut self, byte: u8) -> Result<()> {
        match self {
            Self::Mock(device) => device.write_byte(byte).await,
            Self::Simulated(device) => device.write_byte(byte).await,
            #[cfg(feature = "hardware-serial")]
            Self::Serial(device) => device.write_byte(byte).await,
        }
    }

    async fn read_byte(&mut self) -> Result<u8> {
        match self {
            Self::Mock(device) => device.read_byte().await,
            Self::Simulated(device) => device.read_byte().await,
            #[cfg(feature = "hardware-serial")]
            Self::Serial(device) => device.read_byte().await,
        }
    }

    async fn discard_input(&mut self) -> Result<usize> {
        match self {
            Self::Mock(device) => device.discard_input().await,
            Self::Simulated(device) => device.discard_input().await,
            #[cfg(feature = "hardware-serial")]
            Self::Serial(device) => device.discard_input().await,
        }
    }

    fn info(&self) -> DeviceInfo {
        match self {
            Self::Mock(device) => device.info(),
            Self::Simulated(device) => device.info(),
            #[cfg(feature = "hardware-serial")]
            Self::Serial(device) => device.info(),
        }
    }
}

impl From<MockTransport> for AnyTransport {
    fn from(device: MockTransport) -> Self {
        Self::Mock(device)
    }
}

impl From<SimulatedReader> for AnyTransport {
    fn from(device: SimulatedReader) -> Self {
        Self::Simulated(device)
    }
}

#[cfg(feature = "hardware-serial")]
impl From<SerialPortTransport> for AnyTransport {
    fn from(device: SerialPortTransport) -> Self {
        Self::Serial(device)
    }
}
