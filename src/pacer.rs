//! Fixed-delay request pacing
//!
//! The kline download sleeps a fixed amount before each request instead of
//! tracking a token bucket. Requests are sequential, so a constant gap is
//! enough to stay under the exchange's weight limits.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use tracing::trace;

/// Blocking pacer that sleeps `delay` on every [`RequestPacer::pause`]
#[derive(Debug, Default)]
pub struct RequestPacer {
    delay: Duration,
    pauses: AtomicU64,
}

impl RequestPacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pauses: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Block the calling thread for the configured delay
    pub fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::Relaxed);
        if self.delay.is_zero() {
            return;
        }
        trace!("Pausing {:?} before next request", self.delay);
        thread::sleep(self.delay);
    }

    /// Number of pauses taken so far
    pub fn pauses(&self) -> u64 {
        self.pauses.load(Ordering::Relaxed)
    }
}
