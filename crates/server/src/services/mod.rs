//! Business logic services for the server.
//!
//! # Services
//!
//! - `auth` - Account directory and password authentication

pub mod auth;
