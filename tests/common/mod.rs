//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - In-process test servers (axum-test and real TCP)
//! - Poll fixtures
//! - Real-time channel helpers
//! - Custom assertion macros

pub mod assertions;

// Re-export commonly used utilities
#[allow(unused_imports)]
pub use assertions::*;
#[cfg(feature = "ssr")]
#[allow(unused_imports)]
pub use server::*;

/// Turn string literals into owned option texts
pub fn opts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
