//! Routes Module
//!
//! HTTP route configuration and router assembly.
//!
//! - **`router`** - `create_router`, the full application router with layers
//! - **`api_routes`** - REST routes for polls and health

/// Main router
pub mod router;

/// REST routes
pub mod api_routes;

pub use router::create_router;
