//! Per-client request admission.
//!
//! Each `(scope, client key)` pair gets a fixed window. The first request
//! starts the window; once `limit` requests have been admitted, further
//! requests are refused (and not counted) until the window has elapsed.
//! Windows reset lazily on the next request after expiry, and idle windows
//! age out of the table on their own.
//!
//! The `auth` scope (login) has its own, stricter counter. The `api` scope
//! limit depends on who is asking: anonymous < authenticated < admin.

use std::time::{Duration, Instant};

use moka::Entry;
use moka::ops::compute::Op;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, ShopError};
use crate::types::{Identity, Role};

/// Which counter a request is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateScope {
    /// Authentication endpoints.
    Auth,
    /// Everything else.
    Api,
}

/// Trust level of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Anonymous,
    Authenticated,
    Admin,
}

impl Tier {
    /// Tier for an optional identity.
    #[must_use]
    pub fn of(identity: Option<&Identity>) -> Self {
        match identity.map(|i| i.role) {
            None => Self::Anonymous,
            Some(Role::Customer) => Self::Authenticated,
            Some(Role::Admin) => Self::Admin,
        }
    }
}

/// Limits per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub window: Duration,
    pub auth: u32,
    pub anonymous: u32,
    pub authenticated: u32,
    pub admin: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            auth: 10,
            anonymous: 100,
            authenticated: 300,
            admin: 1000,
        }
    }
}

impl RateLimits {
    /// Requests allowed per window for a scope and tier.
    #[must_use]
    pub const fn limit(&self, scope: RateScope, tier: Tier) -> u32 {
        match (scope, tier) {
            (RateScope::Auth, _) => self.auth,
            (RateScope::Api, Tier::Anonymous) => self.anonymous,
            (RateScope::Api, Tier::Authenticated) => self.authenticated,
            (RateScope::Api, Tier::Admin) => self.admin,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Most `(scope, client)` windows tracked at once.
const MAX_TRACKED_WINDOWS: u64 = 100_000;

/// Fixed-window rate limiter.
///
/// Windows live in a `moka` cache: entries expire one window after their
/// last admitted request, and the table never holds more than
/// [`MAX_TRACKED_WINDOWS`] entries. A client evicted under pressure simply
/// starts a fresh window.
pub struct RateLimiter {
    limits: RateLimits,
    windows: Cache<(RateScope, String), Window>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("limits", &self.limits)
            .field("windows", &self.windows.entry_count())
            .finish()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimits::default())
    }
}

impl RateLimiter {
    /// Create a limiter with the given limits.
    #[must_use]
    pub fn new(limits: RateLimits) -> Self {
        Self::with_capacity(limits, MAX_TRACKED_WINDOWS)
    }

    fn with_capacity(limits: RateLimits, capacity: u64) -> Self {
        let windows = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(limits.window)
            .build();
        Self { limits, windows }
    }

    /// The configured limits.
    #[must_use]
    pub const fn limits(&self) -> &RateLimits {
        &self.limits
    }

    /// Admit or refuse a request now.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::RateLimited` when the caller's window is full.
    pub fn check(&self, scope: RateScope, tier: Tier, key: &str) -> Result<()> {
        self.check_at(scope, tier, key, Instant::now())
    }

    /// Admit or refuse a request at a given instant.
    ///
    /// The read-modify-write on a key's window is atomic with respect to
    /// other requests for the same key.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::RateLimited` when the caller's window is full.
    pub fn check_at(&self, scope: RateScope, tier: Tier, key: &str, now: Instant) -> Result<()> {
        let limit = self.limits.limit(scope, tier);
        let window = self.limits.window;
        let mut outcome = Ok(());

        self.windows
            .entry((scope, key.to_owned()))
            .and_compute_with(|entry| {
                let current = entry
                    .map(Entry::into_value)
                    .filter(|w| now.saturating_duration_since(w.started) < window)
                    .unwrap_or(Window {
                        started: now,
                        count: 0,
                    });

                if current.count >= limit {
                    let elapsed = now.saturating_duration_since(current.started);
                    outcome = Err(retry_after(window.saturating_sub(elapsed)));
                    return Op::Nop;
                }
                Op::Put(Window {
                    count: current.count + 1,
                    ..current
                })
            });

        if let Err(ShopError::RateLimited {
            retry_after_seconds,
        }) = &outcome
        {
            warn!(?scope, ?tier, key, retry_after_seconds, "rate limit exceeded");
        }
        outcome
    }
}

/// Whole seconds until the window reopens, never less than one.
fn retry_after(remaining: Duration) -> ShopError {
    let seconds = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    ShopError::RateLimited {
        retry_after_seconds: seconds.max(1),
    }
}
