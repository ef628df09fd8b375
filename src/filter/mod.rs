//! Prefilter subsystem.
//!
//! # Data Flow
//! ```text
//! matched request (template, path, JSON body, headers)
//!     → chain.rs (for each filter registered for the template, in order)
//!         → invoker.rs (look up strategy by filter name)
//!         → http.rs (POST ApiRequestData, read FilterResponseData)
//!         → 200: merge body/headers by presence; else: stop with that status
//!     → resolve destination (path destination or default)
//! ```
//!
//! # Design Decisions
//! - Filters never run in parallel; order and merge semantics depend on it
//! - New filter kinds plug in through `InvokerRegistry::register` without
//!   touching chain execution
//! - Unknown kinds fail the request rather than being skipped

pub mod chain;
pub mod http;
pub mod invoker;
pub mod types;

pub use chain::{ChainOutcome, ChainRequest, FilterChainExecutor};
pub use http::HttpFilterInvoker;
pub use invoker::{FilterInvoker, InvokerRegistry};
pub use types::{extract_env_id, ApiRequestData, FilterHeaders, FilterResponseData, JsonBody};
