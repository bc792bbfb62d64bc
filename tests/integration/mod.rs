//! Integration tests
//!
//! - `api` - REST endpoints through the full router
//! - `realtime` - the `/ws` room channel
//! - `client` - the client library against mocked and real servers
