//! # PivotCRM Shared Library
//!
//! Shared types, database models, and the permission core used across the
//! PivotCRM API server and automation engine.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `perm`: Capability table and permission checker
//! - `automation`: Triggers, predicates, actions, and domain events
//! - `auth`: JWT authentication utilities
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod automation;
pub mod db;
pub mod models;
pub mod perm;

/// Current version of the PivotCRM shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
