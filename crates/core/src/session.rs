//! Session store.
//!
//! Maps opaque tokens to session records. A record's identity is fixed at
//! login; its mutable part (cart, coupon, last order) sits behind a per-session
//! async mutex so cart operations on one session never contend with another.
//!
//! Sessions live in a `moka` cache with a time-to-idle, so abandoned logins
//! are evicted after a period of inactivity. The cache has no entry bound:
//! a session only ends on logout, account deletion or idle expiry, so every
//! token handed out resolves until then. Logging in again creates a new
//! session and leaves the old token valid.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::cart::Cart;
use crate::checkout::Order;
use crate::coupons::CouponCode;
use crate::types::{Identity, ProductId, SessionToken};

/// Default time a session may sit unused before eviction (24 hours).
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(24 * 60 * 60);

/// Mutable per-session state.
#[derive(Debug, Default)]
pub struct SessionState {
    pub cart: Cart,
    pub applied_coupon: Option<CouponCode>,
    pub last_order: Option<Order>,
}

/// One login session.
#[derive(Debug)]
pub struct Session {
    token: SessionToken,
    identity: Identity,
    state: Mutex<SessionState>,
}

impl Session {
    fn new(token: SessionToken, identity: Identity) -> Self {
        Self {
            token,
            identity,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// The session's token.
    #[must_use]
    pub const fn token(&self) -> &SessionToken {
        &self.token
    }

    /// The identity this session acts for.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Lock the mutable state.
    pub async fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }
}

/// All live sessions.
pub struct SessionStore {
    sessions: Cache<SessionToken, Arc<Session>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.sessions.entry_count())
            .finish()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_IDLE)
    }
}

impl SessionStore {
    /// Create a store evicting sessions idle for longer than `time_to_idle`.
    #[must_use]
    pub fn new(time_to_idle: Duration) -> Self {
        let sessions = Cache::builder()
            .time_to_idle(time_to_idle)
            .build();
        Self { sessions }
    }

    /// Start a new session for an identity.
    pub async fn open(&self, identity: Identity) -> Arc<Session> {
        let token = SessionToken::generate();
        let session = Arc::new(Session::new(token.clone(), identity));
        self.sessions.insert(token, Arc::clone(&session)).await;
        info!(username = %session.identity.username, "session opened");
        session
    }

    /// Look up a live session.
    pub async fn get(&self, token: &SessionToken) -> Option<Arc<Session>> {
        self.sessions.get(token).await
    }

    /// Resolve a token to its identity.
    pub async fn resolve(&self, token: &SessionToken) -> Option<Identity> {
        self.get(token).await.map(|s| s.identity.clone())
    }

    /// End a session. Returns whether it existed.
    pub async fn close(&self, token: &SessionToken) -> bool {
        let removed = self.sessions.remove(token).await;
        if let Some(session) = &removed {
            info!(username = %session.identity.username, "session closed");
        }
        removed.is_some()
    }

    /// End every session belonging to `username`. Returns how many closed.
    pub async fn close_all_for(&self, username: &str) -> usize {
        let tokens: Vec<SessionToken> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.identity.username == username)
            .map(|(token, _)| SessionToken::clone(&token))
            .collect();

        for token in &tokens {
            self.sessions.invalidate(token).await;
        }
        debug!(username, closed = tokens.len(), "sessions closed for user");
        tokens.len()
    }

    /// Whether any live session's cart holds this product.
    pub async fn any_cart_contains(&self, product_id: ProductId) -> bool {
        let sessions: Vec<Arc<Session>> = self.sessions.iter().map(|(_, s)| s).collect();
        for session in sessions {
            if session.state().await.cart.contains(product_id) {
                return true;
            }
        }
        false
    }
}
