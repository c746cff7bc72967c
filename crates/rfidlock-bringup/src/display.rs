//! Console rendering of the status bus.
//!
//! On the board the status bus drives eight LEDs. On a host the
//! [`LedBar`] prints the same pattern as a row of glyphs, bit 7 on the
//! left:
//!
//! ```text
//! ○○○○●●●●  0x0F
//! ```

use rfidlock_core::StatusPattern;
use rfidlock_hardware::{Result, StatusOutput};
use std::io::Write;
use tracing::debug;

const LIT: char = '●';
const DARK: char = '○';

/// Render a pattern as eight glyphs, most significant line first.
///
/// # Examples
///
/// ```
/// use rfidlock_bringup::display::render_bar;
/// use rfidlock_core::StatusPattern;
///
/// assert_eq!(render_bar(StatusPattern::new(0x0F)), "○○○○●●●●");
/// assert_eq!(render_bar(StatusPattern::IDLE), "○○○○○●●●");
/// ```
pub fn render_bar(pattern: StatusPattern) -> String {
    (0..8)
        .rev()
        .map(|line| if pattern.is_lit(line) { LIT } else { DARK })
        .collect()
}

/// Status bus printed to a writer, one line per pattern change.
#[derive(Debug)]
pub struct LedBar<W = std::io::Stdout> {
    out: W,
    current: StatusPattern,
}

impl LedBar {
    /// LED bar printing to standard output.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> LedBar<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            current: StatusPattern::OFF,
        }
    }

    /// Pattern currently shown.
    pub fn current(&self) -> StatusPattern {
        self.current
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> StatusOutput for LedBar<W> {
    async fn render(&mut self, pattern: StatusPattern) -> Result<()> {
        self.current = pattern;
        debug!("Status bus {}", pattern);
        writeln!(self.out, "{}  0x{:02X}", render_bar(pattern), pattern.bits())?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0x00, "○○○○○○○○")]
    #[case(0xFF, "●●●●●●●●")]
    #[case(0xF0, "●●●●○○○○")]
    #[case(0x0A, "○○○○●○●○")]
    fn test_render_bar(#[case] bits: u8, #[case] expected: &str) {
        assert_eq!(render_bar(StatusPattern::new(bits)), expected);
    }

    #[tokio::test]
    async fn test_led_bar_writes_one_line_per_render() {
        let mut bar = LedBar::new(Vec::new());

        bar.render(StatusPattern::new(0x03)).await.unwrap();
        bar.render(StatusPattern::IDLE).await.unwrap();
        assert_eq!(bar.current(), StatusPattern::IDLE);

        let output = String::from_utf8(bar.into_inner()).unwrap();
        assert_eq!(output, "○○○○○○●●  0x03\n○○○○○●●●  0x07\n");
    }
}
