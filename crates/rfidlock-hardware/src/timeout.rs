//! Timeout window shared between the timer and the serial link.
//!
//! On the board the window is a hardware timer whose interrupt
//! sets a flag that the receive loop polls. Here the timer is a Tokio task
//! and the flag is a [`TimeoutFlag`]: a single-slot signal with exactly one
//! producer (the expiry handler) and one consumer (the pending timeout
//! read).
//!
//! # Memory Ordering
//!
//! The expiry handler publishes with `Release`; the consumer reads with
//! `Acquire` and consumes with an `AcqRel` swap, so a consumer that observes
//! the flag also observes everything the timer task did before raising it.
//!
//! # Cadence
//!
//! ```text
//! PerRead       read ──[ period ]── expiry        re-armed by every read
//! FreeRunning   ──[ period ]──[ period ]──[ period ]──  armed once
//! ```
//!
//! With [`Cadence::FreeRunning`] the window is shared across reads, so a
//! read may observe a timeout that accumulated during an earlier, unrelated
//! operation. [`Cadence::PerRead`] measures the period from the start of
//! each read and clears any stale flag first.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// How the timeout window is scheduled relative to reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// Restart the window at the start of every timeout read.
    #[default]
    PerRead,

    /// Periodic timer armed once and never restarted.
    FreeRunning,
}

#[derive(Debug, Default)]
struct FlagInner {
    raised: AtomicBool,
    notify: Notify,
}

/// Single-slot timeout signal.
///
/// Cloning yields another handle to the same flag.
///
/// # Examples
///
/// ```
/// use rfidlock_hardware::timeout::TimeoutFlag;
///
/// let flag = TimeoutFlag::new();
/// let producer = flag.clone();
///
/// producer.raise();
/// assert!(flag.take());
/// assert!(!flag.take());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TimeoutFlag {
    inner: Arc<FlagInner>,
}

impl TimeoutFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag and wake the waiting reader, if any.
    pub fn raise(&self) {
        self.inner.raised.store(true, Ordering::Release);
        self.inner.notify.notify_one();
    }

    /// Check the flag without consuming it.
    pub fn is_raised(&self) -> bool {
        self.inner.raised.load(Ordering::Acquire)
    }

    /// Read and clear the flag in one step.
    pub fn take(&self) -> bool {
        self.inner.raised.swap(false, Ordering::AcqRel)
    }

    /// Clear the flag without reading it.
    pub fn clear(&self) {
        self.inner.raised.store(false, Ordering::Release);
    }

    /// Wait until the flag is raised. Does not consume it.
    ///
    /// Cancel safe: dropping the future leaves the flag untouched.
    pub async fn raised(&self) {
        loop {
            if self.is_raised() {
                return;
            }
            // A raise between the check and this await leaves a stored
            // permit, so the wakeup is not lost.
            self.inner.notify.notified().await;
        }
    }
}

/// Expiry handler: raise the flag and nothing else.
fn on_expiry(flag: &TimeoutFlag) {
    flag.raise();
}

/// Timer producing [`TimeoutFlag`] expiries with a fixed period.
///
/// The period is fixed at construction. Nothing happens until
/// [`arm`](TimeoutWindow::arm) is called; an unarmed window never expires,
/// like a timer whose interrupt is disabled.
///
/// # Panics
///
/// Arming and read bracketing spawn Tokio tasks and must run inside a Tokio
/// runtime.
#[derive(Debug)]
pub struct TimeoutWindow {
    period: Duration,
    cadence: Cadence,
    flag: TimeoutFlag,
    armed: bool,

    /// Running timer task, if any
    timer: Option<JoinHandle<()>>,
}

impl TimeoutWindow {
    pub fn new(period: Duration, cadence: Cadence) -> Self {
        Self {
            period,
            cadence,
            flag: TimeoutFlag::new(),
            armed: false,
            timer: None,
        }
    }

    /// Another handle to the flag this window raises.
    pub fn flag(&self) -> TimeoutFlag {
        self.flag.clone()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Enable the window.
    ///
    /// A free-running window starts its periodic timer here. A per-read
    /// window only becomes eligible to start; its timer runs inside each
    /// timeout read. Arming twice has no further effect.
    pub fn arm(&mut self) {
        if self.armed {
            return;
        }
        self.armed = true;
        debug!(
            "Timeout window armed ({:?}, {}ms)",
            self.cadence,
            self.period.as_millis()
        );

        if self.cadence == Cadence::FreeRunning {
            let flag = self.flag.clone();
            let period = self.period;
            self.timer = Some(tokio::spawn(async move {
                let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    on_expiry(&flag);
                }
            }));
        }
    }

    /// Stop the timer. A raised flag stays raised.
    pub fn disarm(&mut self) {
        self.armed = false;
        self.stop_timer();
    }

    /// Called at the start of a timeout read.
    ///
    /// For a per-read window this clears any stale expiry and starts a
    /// fresh one-shot timer.
    pub fn begin_read(&mut self) {
        if !self.armed || self.cadence != Cadence::PerRead {
            return;
        }

        self.stop_timer();
        self.flag.clear();

        let flag = self.flag.clone();
        let period = self.period;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(period).await;
            trace!("Timeout window expired");
            on_expiry(&flag);
        }));
    }

    /// Called when a timeout read resolved with data.
    ///
    /// A per-read window cancels its pending expiry. The flag itself is not
    /// touched.
    pub fn end_read(&mut self) {
        if self.cadence == Cadence::PerRead {
            self.stop_timer();
        }
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for TimeoutWindow {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(105);

    #[test]
    fn test_flag_take_clears() {
        let flag = TimeoutFlag::new();
        assert!(!flag.take());

        flag.raise();
        assert!(flag.is_raised());
        assert!(flag.take());
        assert!(!flag.is_raised());
    }

    #[tokio::test]
    async fn test_flag_raised_returns_when_already_set() {
        let flag = TimeoutFlag::new();
        flag.raise();
        flag.raised().await;
        // Waiting does not consume
        assert!(flag.is_raised());
    }

    #[tokio::test]
    async fn test_flag_wakes_waiter_from_other_task() {
        let flag = TimeoutFlag::new();
        let producer = flag.clone();

        let waiter = tokio::spawn(async move {
            flag.raised().await;
            flag.take()
        });
        tokio::task::yield_now().await;
        producer.raise();

        assert!(waiter.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unarmed_window_never_expires() {
        let mut window = TimeoutWindow::new(PERIOD, Cadence::PerRead);
        window.begin_read();
        tokio::time::sleep(PERIOD * 3).await;
        assert!(!window.flag().is_raised());
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_read_window_expires_after_period() {
        let mut window = TimeoutWindow::new(PERIOD, Cadence::PerRead);
        let flag = window.flag();
        window.arm();

        // Armed but no read started yet
        tokio::time::sleep(PERIOD * 2).await;
        assert!(!flag.is_raised());

        window.begin_read();
        tokio::time::sleep(PERIOD - Duration::from_millis(1)).await;
        assert!(!flag.is_raised());
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(flag.is_raised());
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_read_window_clears_stale_flag() {
        let mut window = TimeoutWindow::new(PERIOD, Cadence::PerRead);
        let flag = window.flag();
        window.arm();

        flag.raise();
        window.begin_read();
        assert!(!flag.is_raised());
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_read_cancels_pending_expiry() {
        let mut window = TimeoutWindow::new(PERIOD, Cadence::PerRead);
        let flag = window.flag();
        window.arm();

        window.begin_read();
        window.end_read();
        tokio::time::sleep(PERIOD * 2).await;
        assert!(!flag.is_raised());
    }

    #[tokio::test(start_paused = true)]
    async fn test_free_running_window_raises_periodically() {
        let mut window = TimeoutWindow::new(PERIOD, Cadence::FreeRunning);
        let flag = window.flag();
        window.arm();

        tokio::time::sleep(PERIOD + Duration::from_millis(1)).await;
        assert!(flag.take());

        tokio::time::sleep(PERIOD).await;
        assert!(flag.take());
    }

    #[tokio::test(start_paused = true)]
    async fn test_free_running_window_ignores_read_bracketing() {
        let mut window = TimeoutWindow::new(PERIOD, Cadence::FreeRunning);
        let flag = window.flag();
        window.arm();

        tokio::time::sleep(PERIOD + Duration::from_millis(1)).await;
        // A stale expiry survives the start of a new read
        window.begin_read();
        assert!(flag.is_raised());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_stops_timer() {
        let mut window = TimeoutWindow::new(PERIOD, Cadence::FreeRunning);
        let flag = window.flag();
        window.arm();
        window.disarm();

        tokio::time::sleep(PERIOD * 3).await;
        assert!(!flag.is_raised());
        assert!(!window.is_armed());
    }
}
