//! Recording status bus and control line mocks.
//!
//! Both record every value they are driven to, stamped with the Tokio
//! clock, so tests under paused time can check patterns and pulse widths
//! exactly.

use crate::{Result, traits::ControlLine, traits::StatusOutput, types::LineLevel};
use rfidlock_core::StatusPattern;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::Instant;

/// Mock status bus recording every rendered pattern.
///
/// # Examples
///
/// ```
/// use rfidlock_core::StatusPattern;
/// use rfidlock_hardware::mock::MockStatusBus;
/// use rfidlock_hardware::traits::StatusOutput;
///
/// #[tokio::main]
/// async fn main() -> rfidlock_hardware::Result<()> {
///     let (mut bus, handle) = MockStatusBus::new();
///
///     bus.render(StatusPattern::IDLE).await?;
///     assert_eq!(handle.current(), Some(StatusPattern::IDLE));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockStatusBus {
    log: Arc<Mutex<Vec<(Instant, StatusPattern)>>>,
}

impl MockStatusBus {
    pub fn new() -> (Self, MockStatusBusHandle) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                log: Arc::clone(&log),
            },
            MockStatusBusHandle { log },
        )
    }
}

impl StatusOutput for MockStatusBus {
    async fn render(&mut self, pattern: StatusPattern) -> Result<()> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((Instant::now(), pattern));
        Ok(())
    }
}

/// Handle for inspecting a [`MockStatusBus`].
#[derive(Debug, Clone)]
pub struct MockStatusBusHandle {
    log: Arc<Mutex<Vec<(Instant, StatusPattern)>>>,
}

impl MockStatusBusHandle {
    /// Rendered patterns, in order.
    pub fn patterns(&self) -> Vec<StatusPattern> {
        self.history().into_iter().map(|(_, p)| p).collect()
    }

    /// Rendered patterns as raw bus values, in order.
    pub fn bits(&self) -> Vec<u8> {
        self.patterns().iter().map(StatusPattern::bits).collect()
    }

    /// Rendered patterns with the time each one was driven.
    pub fn history(&self) -> Vec<(Instant, StatusPattern)> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Pattern currently displayed.
    pub fn current(&self) -> Option<StatusPattern> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|(_, p)| *p)
    }

    pub fn clear(&self) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Mock control line recording every level change.
#[derive(Debug)]
pub struct MockControlLine {
    log: Arc<Mutex<Vec<(Instant, LineLevel)>>>,
}

impl MockControlLine {
    pub fn new() -> (Self, MockControlLineHandle) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                log: Arc::clone(&log),
            },
            MockControlLineHandle { log },
        )
    }
}

impl ControlLine for MockControlLine {
    async fn set_level(&mut self, level: LineLevel) -> Result<()> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((Instant::now(), level));
        Ok(())
    }
}

/// Handle for inspecting a [`MockControlLine`].
#[derive(Debug, Clone)]
pub struct MockControlLineHandle {
    log: Arc<Mutex<Vec<(Instant, LineLevel)>>>,
}

impl MockControlLineHandle {
    /// Level changes with the time each was driven.
    pub fn history(&self) -> Vec<(Instant, LineLevel)> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Level changes, in order.
    pub fn levels(&self) -> Vec<LineLevel> {
        self.history().into_iter().map(|(_, l)| l).collect()
    }

    /// Current level. The line idles low.
    pub fn level(&self) -> LineLevel {
        self.history()
            .last()
            .map(|(_, l)| *l)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_status_bus_records_in_order() {
        let (mut bus, handle) = MockStatusBus::new();
        assert_eq!(handle.current(), None);

        for bits in [0x0F, 0xF0, 0x00] {
            bus.render(StatusPattern::new(bits)).await.unwrap();
        }

        assert_eq!(handle.bits(), vec![0x0F, 0xF0, 0x00]);
        assert_eq!(handle.current(), Some(StatusPattern::OFF));

        handle.clear();
        assert!(handle.patterns().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_control_line_timestamps() {
        let (mut line, handle) = MockControlLine::new();
        assert_eq!(handle.level(), LineLevel::Low);

        line.set_level(LineLevel::High).await.unwrap();
        tokio::time::sleep(Duration::from_micros(1500)).await;
        line.set_level(LineLevel::Low).await.unwrap();

        let history = handle.history();
        assert_eq!(history[1].0 - history[0].0, Duration::from_micros(1500));
        assert_eq!(handle.levels(), vec![LineLevel::High, LineLevel::Low]);
    }
}
