//! Mock device implementations for testing and development.
//!
//! This module provides simulated devices that can be driven and inspected
//! programmatically without the reader board attached.

pub mod reader;
pub mod status;
pub mod transport;

pub use reader::{ReaderProfile, SimulatedReader};
pub use status::{MockControlLine, MockControlLineHandle, MockStatusBus, MockStatusBusHandle};
pub use transport::{MockTransport, MockTransportHandle};
