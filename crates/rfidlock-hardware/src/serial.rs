//! Physical serial port transport.
//!
//! Built on the blocking `serialport` driver. Reads poll the receive
//! buffer and yield to the runtime between polls, so a pending read holds
//! no data and can be dropped at any await point without losing a byte.

use crate::error::{HardwareError, Result};
use crate::traits::SerialTransport;
use crate::types::{DeviceInfo, LinkSettings, Parity};
use serialport::{ClearBuffer, DataBits, FlowControl, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{debug, info};

/// Interval between receive buffer polls.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Driver-level timeout for a single blocking call.
const PORT_TIMEOUT: Duration = Duration::from_millis(100);

/// Serial port connected to the reader module.
pub struct SerialPortTransport {
    port: Box<dyn SerialPort>,
    path: String,
}

impl std::fmt::Debug for SerialPortTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortTransport")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SerialPortTransport {
    /// Open `path` with the given settings, no flow control, and empty
    /// buffers.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be opened or the settings are
    /// not representable.
    pub fn open(path: &str, settings: &LinkSettings) -> Result<Self> {
        let port = serialport::new(path, settings.baud_rate)
            .data_bits(data_bits(settings.data_bits)?)
            .parity(parity(settings.parity))
            .stop_bits(stop_bits(settings.stop_bits)?)
            .flow_control(FlowControl::None)
            .timeout(PORT_TIMEOUT)
            .open()
            .map_err(|e| HardwareError::initialization_failed(format!("{path}: {e}")))?;
        port.clear(ClearBuffer::All)?;

        info!("Opened serial port {} ({})", path, settings);

        Ok(Self {
            port,
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl SerialTransport for SerialPortTransport {
    async fn configure(&mut self, settings: &LinkSettings) -> Result<()> {
        self.port.set_baud_rate(settings.baud_rate)?;
        self.port.set_data_bits(data_bits(settings.data_bits)?)?;
        self.port.set_parity(parity(settings.parity))?;
        self.port.set_stop_bits(stop_bits(settings.stop_bits)?)?;
        self.port.set_flow_control(FlowControl::None)?;
        debug!("Serial port {} configured ({})", self.path, settings);
        Ok(())
    }

    async fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.port.write_all(&[byte])?;
        self.port.flush()?;
        Ok(())
    }

    async fn read_byte(&mut self) -> Result<u8> {
        loop {
            if self.port.bytes_to_read()? > 0 {
                let mut buffer = [0u8; 1];
                let read = self.port.read(&mut buffer)?;
                if read == 1 {
                    return Ok(buffer[0]);
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn discard_input(&mut self) -> Result<usize> {
        let pending = self.port.bytes_to_read()?;
        self.port.clear(ClearBuffer::Input)?;
        Ok(pending as usize)
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.path.clone(), "Serial Port")
    }
}

fn data_bits(bits: u8) -> Result<DataBits> {
    match bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        other => Err(HardwareError::configuration(format!(
            "unsupported data bits: {other}"
        ))),
    }
}

fn parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Even => serialport::Parity::Even,
        Parity::Odd => serialport::Parity::Odd,
    }
}

fn stop_bits(bits: u8) -> Result<StopBits> {
    match bits {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        other => Err(HardwareError::configuration(format!(
            "unsupported stop bits: {other}"
        ))),
    }
}
