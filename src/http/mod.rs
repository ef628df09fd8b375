//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, request ID)
//!     → routing snapshot lookup (method + path template)
//!         matched:   request.rs (JSON body, filter headers)
//!                    → filter chain → request.rs (outbound headers)
//!                    → proxy dispatcher → destination
//!         unmatched: → proxy dispatcher → default destination
//!     → streamed response to client
//! ```

pub mod request;
pub mod server;

pub use server::{AppState, HttpServer, RELOAD_PATH};
