//! Database layer for data persistence and access.
//!
//! Implements the data access layer using SQLx over SQLite, following the
//! repository pattern: [`handlers`] holds repository implementations over a
//! borrowed connection, [`models`] the record structures matching table
//! schemas, and [`errors`] the database-specific error types.
//!
//! Migrations live in `migrations/` and run at startup via
//! [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
