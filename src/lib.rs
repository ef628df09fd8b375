//! API filter proxy library.
//!
//! A reverse proxy that runs an ordered chain of external HTTP filters over
//! each matching request before forwarding it to the destination configured
//! for its path. Routing comes from a JSON config file that can be reloaded
//! while serving traffic.

pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::{ConfigStore, ProxySettings};
pub use error::ProxyError;
pub use filter::{FilterChainExecutor, FilterInvoker, InvokerRegistry};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
