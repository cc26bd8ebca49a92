//! Common type definitions shared across layers.

/// User account identifier, assigned by the storage engine.
pub type UserId = i64;
