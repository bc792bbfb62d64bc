//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the poll server and the poll client. These types are used for
//! serialization over the REST API and the real-time room channel.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both server and client code. All types are designed for serialization
//! and transmission over HTTP and WebSocket frames.

/// Poll documents and REST bodies
pub mod poll;

/// Real-time channel events
pub mod event;

/// Shared error types
pub mod error;

/// Client configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use poll::{Poll, PollOption, PollSnapshot};
pub use event::{ClientEvent, ServerEvent, VoteIntent};
pub use error::{ErrorBody, PollError};
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
