//! Shared test utilities for integration tests.
//!
//! This module provides:
//! - A seeded in-memory multisite network
//! - Item draft builders
//! - Engine wiring helpers

pub mod fixtures;

pub use fixtures::*;
