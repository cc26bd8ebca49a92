//! Authentication and trial-entitlement core.
//!
//! This is the part of the system with real invariants:
//!
//! - [`password`]: Argon2 credential hashing and constant-time verification
//! - [`session`]: signed, time-limited session tokens (stateless, no
//!   server-side revocation - logout is client-side cookie removal only)
//! - [`trial`]: pure trial-window arithmetic over an injected clock
//! - [`gateway`]: the login entry points orchestrating store, verifier,
//!   trial policy and token codec, short-circuiting on first failure
//! - [`current_user`]: axum extractors turning a session cookie back into
//!   an account, including the admin capability check
pub mod current_user;
pub mod gateway;
pub mod password;
pub mod session;
pub mod trial;
