//! Host-side stand-in for the actuator line.

use crate::error::Result;
use crate::traits::ControlLine;
use crate::types::LineLevel;
use tracing::info;

/// Control line that only logs level changes.
///
/// Used by the host driver where no actuator is wired.
#[derive(Debug, Clone, Default)]
pub struct ConsoleControlLine {
    label: String,
    level: LineLevel,
}

impl ConsoleControlLine {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            level: LineLevel::Low,
        }
    }

    pub fn level(&self) -> LineLevel {
        self.level
    }
}

impl ControlLine for ConsoleControlLine {
    async fn set_level(&mut self, level: LineLevel) -> Result<()> {
        self.level = level;
        info!(line = %self.label, %level, "Control line set");
        Ok(())
    }
}
