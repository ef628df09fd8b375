//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (binding lookup)
//!     → matcher.rs (evaluate path template)
//!     → Return: matched template or NoMatch (→ default destination)
//!
//! Route Compilation (on every load/reload):
//!     Prefilters[]
//!     → for each path, for each method: bind
//!     → Freeze as immutable RouteTable inside the routing snapshot
//! ```

pub mod matcher;
pub mod router;

pub use matcher::PathTemplate;
pub use router::RouteTable;
