//! Destination forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! post-chain request (method, URI, final headers, final body)
//!     → dispatcher.rs (bind SingleHostProxy to resolved destination)
//!     → rewrite URI, strip hop-by-hop headers, add X-Forwarded-For
//!     → pooled hyper client
//!     → streamed response back to the HTTP layer
//! ```

pub mod dispatcher;

pub use dispatcher::{ProxyDispatcher, SingleHostProxy};
