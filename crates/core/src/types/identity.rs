//! Authenticated identity and the behavior quirks attached to it.

use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular shopper.
    #[default]
    Customer,
    /// Can manage products, stock, users and see every order.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Simulated quirk attached to an account.
///
/// Test suites log in as a particular account to exercise the matching
/// failure mode on the client side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorType {
    /// No quirks.
    #[default]
    Standard,
    /// Login is refused after the password is verified.
    LockedOut,
    /// Every product image resolves to a broken reference.
    Problem,
    /// Login and catalog reads are artificially slow.
    PerformanceGlitch,
    /// Checkout always fails after a delay.
    Error,
}

impl BehaviorType {
    /// All behavior types, in display order.
    pub const ALL: [Self; 5] = [
        Self::Standard,
        Self::LockedOut,
        Self::Problem,
        Self::PerformanceGlitch,
        Self::Error,
    ];

    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::LockedOut => "locked_out",
            Self::Problem => "problem",
            Self::PerformanceGlitch => "performance_glitch",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for BehaviorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BehaviorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|behavior| behavior.as_str() == s)
            .ok_or_else(|| format!("invalid behavior type: {s}"))
    }
}

/// The identity a session acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub username: String,
    pub role: Role,
    pub behavior_type: BehaviorType,
}

impl Identity {
    /// Create a new identity.
    #[must_use]
    pub fn new(username: impl Into<String>, role: Role, behavior_type: BehaviorType) -> Self {
        Self {
            username: username.into(),
            role,
            behavior_type,
        }
    }

    /// Whether this identity may use admin operations.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_behavior_round_trips_through_str() {
        for behavior in BehaviorType::ALL {
            assert_eq!(behavior.as_str().parse::<BehaviorType>().unwrap(), behavior);
        }
        assert!("sleepy".parse::<BehaviorType>().is_err());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_identity_serializes_camel_case() {
        let identity = Identity::new("error_user", Role::Customer, BehaviorType::Error);
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["behaviorType"], "error");
        assert_eq!(json["role"], "customer");
        assert!(!identity.is_admin());
    }
}
