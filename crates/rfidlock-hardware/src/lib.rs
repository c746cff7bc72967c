//! Hardware abstraction layer for the reader bring-up.
//!
//! The bring-up sequence needs three things from the board: a byte-level
//! serial link to the reader module, an 8-line status bus, and the door
//! actuator's control line. This crate defines those as traits, provides
//! the timeout-aware [`SerialLink`] built on top of the transport, and
//! ships mock and simulated implementations for running everything on a
//! host.
//!
//! # Design
//!
//! - **Async-first**: all I/O uses native `async fn` in traits (Rust 1.90 +
//!   Edition 2024 RPITIT).
//! - **Static dispatch**: the traits are not object-safe; use generics or
//!   [`AnyTransport`](devices::AnyTransport).
//! - **One shared flag**: the timer task and the timeout read share only a
//!   [`TimeoutFlag`](timeout::TimeoutFlag).
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use rfidlock_hardware::link::SerialLink;
//! use rfidlock_hardware::mock::SimulatedReader;
//! use rfidlock_hardware::timeout::{Cadence, TimeoutWindow};
//! use rfidlock_hardware::types::LinkSettings;
//!
//! #[tokio::main]
//! async fn main() -> rfidlock_hardware::Result<()> {
//!     let window = TimeoutWindow::new(Duration::from_millis(105), Cadence::PerRead);
//!     let mut link = SerialLink::new(SimulatedReader::default(), window);
//!
//!     link.init(&LinkSettings::default()).await?;
//!     link.arm_timeout();
//!
//!     link.write_byte(0x55).await?;
//!     let reply = link.read_byte_or_timeout().await?;
//!     println!("Echo reply: {reply:02X}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Feature Flags
//!
//! - `hardware-serial`: physical serial port transport over `serialport`.

pub mod actuator;
pub mod console;
pub mod devices;
pub mod error;
pub mod link;
pub mod mock;
#[cfg(feature = "hardware-serial")]
pub mod serial;
pub mod timeout;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use actuator::DoorActuator;
pub use devices::AnyTransport;
pub use error::{HardwareError, Result};
pub use link::SerialLink;
pub use timeout::{Cadence, TimeoutFlag, TimeoutWindow};
pub use traits::{ControlLine, SerialTransport, StatusOutput};
pub use types::{DeviceInfo, LineLevel, LinkSettings, Parity};

#[cfg(feature = "hardware-serial")]
pub use serial::SerialPortTransport;
