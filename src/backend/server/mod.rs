//! Server Module
//!
//! Server initialization, application state and configuration.
//!
//! - **`config`** - `ServerConfig` from the environment, database loading
//! - **`state`** - `AppState` and its `FromRef` implementations
//! - **`init`** - `create_app`, which wires everything into a router

/// Server configuration
pub mod config;

/// Application state
pub mod state;

/// Server initialization
pub mod init;

pub use config::ServerConfig;
pub use init::create_app;
pub use state::AppState;
