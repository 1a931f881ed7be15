//! HTTP middleware stack for the server.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, per-request hub)
//! 2. `TraceLayer` (request span with `request_id` and `username` fields)
//! 3. Request ID (record on span, echo in response)
//! 4. CORS
//! 5. Security headers
//! 6. Rate limiting (`/api` only; auth endpoints have their own limit)
//!
//! Authentication is not a layer: handlers take `RequireAuth`,
//! `RequireAdmin` or `OptionalAuth` extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{Caller, OptionalAuth, RequireAdmin, RequireAuth};
pub use rate_limit::{api_rate_limit, auth_rate_limit};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
