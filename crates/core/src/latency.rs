//! Artificial latency for behavior-flagged identities.
//!
//! Delays are the only points where an engine operation suspends. Other
//! requests keep running while a delay is pending and may change stock or
//! sessions. A started delay always runs to completion.

use std::time::Duration;

use tracing::debug;

use crate::types::BehaviorType;

/// Default delay for `performance_glitch` identities.
pub const DEFAULT_SLOW_DELAY: Duration = Duration::from_millis(3000);

/// Default delay before an injected checkout failure.
pub const DEFAULT_FAILURE_DELAY: Duration = Duration::from_millis(1500);

/// Where in a request a delay may be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelayPoint {
    Login,
    CatalogRead,
    CheckoutFailure,
}

/// Awaitable delay capability keyed on behavior type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyInjector {
    slow: Duration,
    failure: Duration,
}

impl Default for LatencyInjector {
    fn default() -> Self {
        Self::new(DEFAULT_SLOW_DELAY, DEFAULT_FAILURE_DELAY)
    }
}

impl LatencyInjector {
    /// Create an injector with the given delays.
    #[must_use]
    pub const fn new(slow: Duration, failure: Duration) -> Self {
        Self { slow, failure }
    }

    /// An injector that never waits.
    #[must_use]
    pub const fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// The delay a behavior incurs at a point, if any.
    #[must_use]
    pub const fn delay_for(&self, behavior: BehaviorType, point: DelayPoint) -> Option<Duration> {
        match (behavior, point) {
            (BehaviorType::PerformanceGlitch, DelayPoint::Login | DelayPoint::CatalogRead) => {
                Some(self.slow)
            }
            (BehaviorType::Error, DelayPoint::CheckoutFailure) => Some(self.failure),
            _ => None,
        }
    }

    /// Wait out the delay for a behavior at a point.
    pub async fn inject(&self, behavior: BehaviorType, point: DelayPoint) {
        if let Some(delay) = self.delay_for(behavior, point)
            && !delay.is_zero()
        {
            debug!(%behavior, ?point, delay_ms = delay.as_millis(), "injecting latency");
            tokio::time::sleep(delay).await;
        }
    }
}
