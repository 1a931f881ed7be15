//! Authentication service.
//!
//! Holds the account directory: usernames mapped to argon2id password hashes,
//! a role and a behavior type. Accounts live in memory for the life of the
//! process and are seeded at startup.

mod error;

pub use error::AuthError;

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use practice_shop_core::{BehaviorType, Identity, Role};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Accounts created at startup, all sharing the seed password.
pub const SEED_ACCOUNTS: &[(&str, Role, BehaviorType)] = &[
    ("standard_user", Role::Customer, BehaviorType::Standard),
    ("locked_out_user", Role::Customer, BehaviorType::LockedOut),
    ("problem_user", Role::Customer, BehaviorType::Problem),
    (
        "performance_glitch_user",
        Role::Customer,
        BehaviorType::PerformanceGlitch,
    ),
    ("error_user", Role::Customer, BehaviorType::Error),
    ("admin", Role::Admin, BehaviorType::Standard),
];

/// Argon2 work factor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HashCost {
    /// The argon2 crate's recommended parameters.
    #[default]
    Standard,
    /// The smallest parameters argon2 accepts. Test suites only.
    Minimal,
}

impl HashCost {
    fn params(self) -> Params {
        match self {
            Self::Standard => Params::DEFAULT,
            Self::Minimal => Params::new(
                Params::MIN_M_COST,
                Params::MIN_T_COST,
                Params::MIN_P_COST,
                None,
            )
            .unwrap_or_default(),
        }
    }
}

/// A stored account.
#[derive(Debug, Clone)]
struct Account {
    identity: Identity,
    password_hash: String,
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub username: String,
    pub role: Role,
    pub behavior_type: BehaviorType,
}

impl From<&Identity> for UserSummary {
    fn from(identity: &Identity) -> Self {
        Self {
            username: identity.username.clone(),
            role: identity.role,
            behavior_type: identity.behavior_type,
        }
    }
}

/// Request to create an account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub behavior_type: BehaviorType,
}

/// In-memory account directory.
pub struct UserDirectory {
    accounts: RwLock<HashMap<String, Account>>,
    hasher: Argon2<'static>,
}

impl std::fmt::Debug for UserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDirectory")
            .field("accounts", &self.read().len())
            .finish_non_exhaustive()
    }
}

impl UserDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new(cost: HashCost) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, cost.params()),
        }
    }

    /// Create a directory holding the seed accounts.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` if the password is too short and
    /// `AuthError::PasswordHash` if hashing fails.
    pub fn seeded(password: &SecretString, cost: HashCost) -> Result<Self, AuthError> {
        let directory = Self::new(cost);
        for (username, role, behavior_type) in SEED_ACCOUNTS {
            directory.create(NewUser {
                username: (*username).to_string(),
                password: password.expose_secret().to_string(),
                role: *role,
                behavior_type: *behavior_type,
            })?;
        }
        Ok(directory)
    }

    /// Verify a username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown user or wrong
    /// password, and `AuthError::LockedOut` if the password is correct but the
    /// account is locked out.
    #[instrument(skip(self, password))]
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        let account = self
            .read()
            .get(username)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&self.hasher, password, &account.password_hash)?;

        if account.identity.behavior_type == BehaviorType::LockedOut {
            warn!("locked out account attempted login");
            return Err(AuthError::LockedOut);
        }
        Ok(account.identity)
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` for a blank username or a password
    /// under eight characters, and `AuthError::UserAlreadyExists` if the
    /// username is taken.
    #[instrument(skip(self, new), fields(username = %new.username))]
    pub fn create(&self, new: NewUser) -> Result<UserSummary, AuthError> {
        let username = new.username.trim();
        if username.is_empty() {
            return Err(AuthError::InvalidInput("username is required".to_string()));
        }
        validate_password(&new.password)?;

        if self.read().contains_key(username) {
            return Err(AuthError::UserAlreadyExists);
        }
        let password_hash = hash_password(&self.hasher, &new.password)?;

        let identity = Identity::new(username, new.role, new.behavior_type);
        let summary = UserSummary::from(&identity);
        let mut accounts = self.write();
        if accounts.contains_key(username) {
            return Err(AuthError::UserAlreadyExists);
        }
        accounts.insert(
            username.to_string(),
            Account {
                identity,
                password_hash,
            },
        );
        info!(role = %summary.role, behavior = %summary.behavior_type, "user created");
        Ok(summary)
    }

    /// Remove an account.
    ///
    /// Live sessions of the account are not touched here; callers close them
    /// through the shop.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if there is no such account.
    #[instrument(skip(self))]
    pub fn delete(&self, username: &str) -> Result<UserSummary, AuthError> {
        let account = self
            .write()
            .remove(username)
            .ok_or(AuthError::UserNotFound)?;
        info!("user deleted");
        Ok(UserSummary::from(&account.identity))
    }

    /// All accounts, ordered by username.
    #[must_use]
    pub fn list(&self) -> Vec<UserSummary> {
        let mut users: Vec<UserSummary> = self
            .read()
            .values()
            .map(|account| UserSummary::from(&account.identity))
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the directory has no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Account>> {
        self.accounts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Account>> {
        self.accounts.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(hasher: &Argon2<'_>, password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::PasswordHash)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC string.
fn verify_password(hasher: &Argon2<'_>, password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;
    hasher
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn directory() -> UserDirectory {
        UserDirectory::seeded(&SecretString::from("secret_sauce"), HashCost::Minimal).unwrap()
    }

    #[test]
    fn test_seeded_accounts() {
        let users = directory().list();
        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "admin",
                "error_user",
                "locked_out_user",
                "performance_glitch_user",
                "problem_user",
                "standard_user",
            ]
        );
    }

    #[test]
    fn test_authenticate() {
        let directory = directory();
        let identity = directory
            .authenticate("problem_user", "secret_sauce")
            .unwrap();
        assert_eq!(identity.behavior_type, BehaviorType::Problem);
        assert_eq!(identity.role, Role::Customer);

        let admin = directory.authenticate("admin", "secret_sauce").unwrap();
        assert!(admin.is_admin());
    }

    #[test]
    fn test_wrong_password_and_unknown_user() {
        let directory = directory();
        assert!(matches!(
            directory.authenticate("standard_user", "wrong_password"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            directory.authenticate("nobody", "secret_sauce"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_locked_out_needs_correct_password() {
        let directory = directory();
        assert!(matches!(
            directory.authenticate("locked_out_user", "secret_sauce"),
            Err(AuthError::LockedOut)
        ));
        assert!(matches!(
            directory.authenticate("locked_out_user", "nope-nope"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_create_validation() {
        let directory = directory();
        let new = |username: &str, password: &str| NewUser {
            username: username.to_string(),
            password: password.to_string(),
            role: Role::Customer,
            behavior_type: BehaviorType::Standard,
        };

        assert!(matches!(
            directory.create(new("  ", "long enough")),
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            directory.create(new("shorty", "1234567")),
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            directory.create(new("standard_user", "long enough")),
            Err(AuthError::UserAlreadyExists)
        ));

        let created = directory.create(new(" visual_user ", "long enough")).unwrap();
        assert_eq!(created.username, "visual_user");
        directory.authenticate("visual_user", "long enough").unwrap();
    }

    #[test]
    fn test_delete() {
        let directory = directory();
        directory.delete("problem_user").unwrap();
        assert_eq!(directory.len(), SEED_ACCOUNTS.len() - 1);
        assert!(matches!(
            directory.delete("problem_user"),
            Err(AuthError::UserNotFound)
        ));
        assert!(matches!(
            directory.authenticate("problem_user", "secret_sauce"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_new_user_defaults() {
        let new: NewUser =
            serde_json::from_str(r#"{"username":"u","password":"p4ssw0rd!"}"#).unwrap();
        assert_eq!(new.role, Role::Customer);
        assert_eq!(new.behavior_type, BehaviorType::Standard);
    }
}
