//! Backend Error Module
//!
//! This module defines error types specific to the poll server.
//! These errors are used by the repository and the HTTP handlers and can be
//! converted to HTTP responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - Error conversion implementations
//! ```
//!
//! # HTTP Response Conversion
//!
//! `BackendError` implements `IntoResponse`, so handlers return it directly.
//! The body is the shared `ErrorBody` plus the numeric status, which lets
//! the client rebuild the original `PollError` by its `kind`.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::BackendError;
