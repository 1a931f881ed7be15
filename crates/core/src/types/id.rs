//! Newtype identifiers for catalog entries, sessions and orders.
//!
//! Each wrapper keeps one kind of identifier from being passed where another
//! is expected: a [`ProductId`] is never a quantity, and a [`SessionToken`]
//! is never a username.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog product identifier.
///
/// Ids are non-negative integers assigned in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u32);

impl ProductId {
    /// Create a new ID from a `u32` value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the underlying `u32` value.
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ProductId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<ProductId> for u32 {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

/// Opaque bearer token identifying one login session.
///
/// Tokens are random UUIDs rendered without hyphens. They are unique for the
/// lifetime of the process but carry no cryptographic guarantees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a fresh token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap a token received from a client.
    #[must_use]
    pub fn from_client(raw: &str) -> Self {
        Self(raw.trim().to_owned())
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order identifier, e.g. `ORD-000042-9f86d081`.
///
/// The zero-padded sequence number makes ids unique for the process lifetime;
/// the random suffix keeps them from being guessable across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Build the id for the given sequence number.
    #[must_use]
    pub fn from_sequence(sequence: u64) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        let suffix = suffix.get(..8).unwrap_or(&suffix);
        Self(format!("ORD-{sequence:06}-{suffix}"))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_serializes_as_number() {
        let json = serde_json::to_string(&ProductId::new(4)).unwrap_or_default();
        assert_eq!(json, "4");
    }

    #[test]
    fn test_session_tokens_are_unique() {
        let a = SessionToken::generate();
        let b = SessionToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_client_token_is_trimmed() {
        let token = SessionToken::from_client("  abc123 ");
        assert_eq!(token.as_str(), "abc123");
    }

    #[test]
    fn test_order_id_format() {
        let id = OrderId::from_sequence(42);
        assert!(id.as_str().starts_with("ORD-000042-"));
        assert_eq!(id.as_str().len(), "ORD-000042-".len() + 8);
    }
}
