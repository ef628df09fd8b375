//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config.json
//!     → loader.rs (read & deserialize)
//!     → store.rs (derive path maps + route table into a RoutingSnapshot)
//!     → shared via Arc<ConfigStore> with the server and chain executor
//!
//! On reload (admin route, SIGHUP, or watcher.rs):
//!     → try-acquire the reload gate (skip if busy)
//!     → loader.rs loads the file again
//!     → new RoutingSnapshot built off to the side
//!     → atomic swap; in-flight requests keep the snapshot they started with
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable; changes require a full reload
//! - A failed reload never touches the live snapshot
//! - Startup settings (settings.rs) are separate from the reloadable file

pub mod loader;
pub mod schema;
pub mod settings;
pub mod store;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{ConfigFileFields, Destination, Filter};
pub use settings::ProxySettings;
pub use store::{ConfigStore, ReloadOutcome, RoutingSnapshot};
pub use watcher::ConfigWatcher;
