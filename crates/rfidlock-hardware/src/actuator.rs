//! Door actuator pulse control.
//!
//! The lock is driven by a single control line: a high pulse of one width
//! opens it, a shorter one closes it. There is no position feedback and no
//! interlock.

use crate::error::Result;
use crate::traits::ControlLine;
use crate::types::LineLevel;
use rfidlock_core::constants::{DEFAULT_CLOSE_PULSE_US, DEFAULT_OPEN_PULSE_US};
use std::time::Duration;
use tracing::debug;

/// Pulse-width door actuator.
///
/// # Examples
///
/// ```
/// use rfidlock_hardware::actuator::DoorActuator;
/// use rfidlock_hardware::mock::MockControlLine;
///
/// #[tokio::main]
/// async fn main() -> rfidlock_hardware::Result<()> {
///     let (line, handle) = MockControlLine::new();
///     let mut door = DoorActuator::with_default_pulses(line);
///
///     door.open().await?;
///     assert_eq!(handle.levels().len(), 2);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct DoorActuator<L> {
    line: L,
    open_pulse: Duration,
    close_pulse: Duration,
}

impl<L: ControlLine> DoorActuator<L> {
    pub fn new(line: L, open_pulse: Duration, close_pulse: Duration) -> Self {
        Self {
            line,
            open_pulse,
            close_pulse,
        }
    }

    /// Actuator with 2000 µs open and 1000 µs close pulses.
    pub fn with_default_pulses(line: L) -> Self {
        Self::new(
            line,
            Duration::from_micros(DEFAULT_OPEN_PULSE_US),
            Duration::from_micros(DEFAULT_CLOSE_PULSE_US),
        )
    }

    pub async fn open(&mut self) -> Result<()> {
        debug!("Door open pulse ({}us)", self.open_pulse.as_micros());
        self.pulse(self.open_pulse).await
    }

    pub async fn close(&mut self) -> Result<()> {
        debug!("Door close pulse ({}us)", self.close_pulse.as_micros());
        self.pulse(self.close_pulse).await
    }

    /// Drive the line high for `width`, then low.
    pub async fn pulse(&mut self, width: Duration) -> Result<()> {
        self.line.set_level(LineLevel::High).await?;
        tokio::time::sleep(width).await;
        self.line.set_level(LineLevel::Low).await
    }

    pub fn line(&self) -> &L {
        &self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockControlLine;
    use rstest::rstest;

    #[rstest]
    #[case(true, 2000)]
    #[case(false, 1000)]
    #[tokio::test(start_paused = true)]
    async fn test_pulse_width(#[case] open: bool, #[case] width_us: u64) {
        let (line, handle) = MockControlLine::new();
        let mut door = DoorActuator::with_default_pulses(line);

        if open {
            door.open().await.unwrap();
        } else {
            door.close().await.unwrap();
        }

        let history = handle.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].1, LineLevel::High);
        assert_eq!(history[1].1, LineLevel::Low);
        assert_eq!(history[1].0 - history[0].0, Duration::from_micros(width_us));
    }

    #[tokio::test(start_paused = true)]
    async fn test_line_ends_low() {
        let (line, handle) = MockControlLine::new();
        let mut door = DoorActuator::new(
            line,
            Duration::from_millis(5),
            Duration::from_millis(3),
        );

        door.open().await.unwrap();
        door.close().await.unwrap();

        assert_eq!(handle.level(), LineLevel::Low);
        assert_eq!(handle.levels().len(), 4);
    }
}
