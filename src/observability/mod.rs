//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (filter calls, proxied requests, reloads)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID (x-request-id) is set by middleware and flows to filters
//!   and destinations as an ordinary header
//! - Metrics are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
