//! Fixed-interval pacing between upstream requests
//!
//! The geolocation API is rate limited, so consecutive lookups are separated
//! by a constant pause. Failed attempts are paced like successful ones and
//! are never retried.

use std::time::Duration;
use tracing::trace;

/// Default pause between two lookups
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPacer {
    delay: Duration,
}

impl RequestPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Pacer that never waits
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait out the pause that must follow a request
    pub async fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }
        trace!("Pacing next lookup by {:?}", self.delay);
        tokio::time::sleep(self.delay).await;
    }
}

impl Default for RequestPacer {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_pause_waits_configured_delay() {
        let pacer = RequestPacer::default();
        let start = Instant::now();

        pacer.pause().await;
        pacer.pause().await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(210), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_pacer_does_not_wait() {
        let start = Instant::now();
        RequestPacer::disabled().pause().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
