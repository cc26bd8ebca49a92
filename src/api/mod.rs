//! HTTP request handling and wire models.
//!
//! - **[`handlers`]**: axum route handlers (interactive login, the desktop
//!   client's JSON auth endpoint, and admin account mutations)
//! - **[`models`]**: request/response structures, including the legacy wire
//!   field names the desktop client depends on
pub mod handlers;
pub mod models;
