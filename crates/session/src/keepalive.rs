//! Keep-alive timer owned by a live session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

/// Periodic ping timer.
///
/// Created when the session enters `Live` and dropped when it leaves; the
/// shared `active` flag mirrors its lifetime so observers of the session can
/// tell whether a timer exists.
pub(crate) struct KeepAlive {
    interval: Interval,
    active: Arc<AtomicBool>,
}

impl KeepAlive {
    pub(crate) fn start(period: Duration, active: Arc<AtomicBool>) -> Self {
        // First tick one full period from now, not immediately.
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        active.store(true, Ordering::SeqCst);
        Self { interval, active }
    }

    pub(crate) async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

/// Waits for the next tick, or forever when no timer exists.
pub(crate) async fn next_tick(keepalive: &mut Option<KeepAlive>) {
    match keepalive {
        Some(k) => k.tick().await,
        None => std::future::pending().await,
    }
}
