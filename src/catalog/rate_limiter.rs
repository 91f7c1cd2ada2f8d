//! Minimum-spacing limiter for outbound catalog requests.

use std::fmt;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::{direct::NotKeyed, InMemoryState};
use governor::Quota;

type DirectLimiter = governor::RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Serializes callers and spaces consecutive acquisitions at least
/// `min_interval` apart.
///
/// Spacing is a one-cell `governor` quota replenished once per interval.
/// Callers pass through a single gate and wait for the quota while holding
/// it, so concurrent callers queue behind each other instead of bursting.
pub struct RateLimiter {
    min_interval: Duration,
    quota: Option<DirectLimiter>,
    clock: DefaultClock,
    gate: Mutex<()>,
}

impl RateLimiter {
    /// A zero interval disables limiting.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            quota: Quota::with_period(min_interval).map(DirectLimiter::direct),
            clock: DefaultClock::default(),
            gate: Mutex::new(()),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until the caller may issue its request.
    pub fn acquire(&self) {
        let Some(ref quota) = self.quota else {
            return;
        };
        // A poisoned gate only means another caller panicked while waiting.
        let _gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        while let Err(not_until) = quota.check() {
            let wait = not_until.wait_time_from(self.clock.now());
            thread::sleep(wait.min(self.min_interval));
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(crate::config::MIN_REQUEST_INTERVAL)
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("min_interval", &self.min_interval)
            .finish()
    }
}
