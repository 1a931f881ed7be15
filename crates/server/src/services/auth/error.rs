//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during authentication and account management.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password was correct but the account is locked out.
    #[error("this account has been locked out")]
    LockedOut,

    /// Username already taken.
    #[error("user already exists")]
    UserAlreadyExists,

    /// No account with this username.
    #[error("user not found")]
    UserNotFound,

    /// Blank username or password too weak.
    #[error("invalid account details: {0}")]
    InvalidInput(String),

    /// Password hashing failed.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Stable code clients can match on.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::LockedOut => "LOCKED_OUT",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::PasswordHash => "INTERNAL_ERROR",
        }
    }
}
