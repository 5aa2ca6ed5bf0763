//! Integration test infrastructure for ProxySQL configuration managers
//!
//! Provides:
//! - An in-memory admin store that enforces the table's constraints
//! - Catalog fixtures for common topologies
//! - Table and statement-log verification helpers

pub mod fixtures;
mod store;
mod verification;

pub use fixtures::*;
pub use store::{FakeAdminStore, StoredRow};
pub use verification::*;
