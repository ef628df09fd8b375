//! Live routing state and reload.
//!
//! The config file, the two path maps derived from it and the route table are
//! kept together in one immutable [`RoutingSnapshot`]. A reload builds a new
//! snapshot off to the side and publishes it with a single pointer swap, so a
//! reader holding a snapshot never sees a mix of old and new state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::{ConfigFileFields, Destination, Filter};
use crate::observability::metrics;
use crate::routing::RouteTable;

/// Everything derived from one read of the config file.
#[derive(Debug, Clone, Default)]
pub struct RoutingSnapshot {
    pub config: ConfigFileFields,
    /// Path template → filters, in declaration order.
    pub path_prefilters: HashMap<String, Vec<Filter>>,
    /// Path template → destination, last declaration wins.
    pub path_destinations: HashMap<String, Destination>,
    pub routes: RouteTable,
}

impl RoutingSnapshot {
    /// Derive the path maps and route table from a parsed config.
    pub fn build(config: ConfigFileFields) -> Result<Self, ConfigError> {
        let mut path_prefilters: HashMap<String, Vec<Filter>> = HashMap::new();
        for filter in &config.prefilters {
            for path in &filter.paths {
                path_prefilters
                    .entry(path.clone())
                    .or_default()
                    .push(filter.clone());
            }
        }

        let mut path_destinations = HashMap::new();
        for destination in &config.destinations {
            for path in &destination.paths {
                path_destinations.insert(path.clone(), destination.clone());
            }
        }

        let routes = RouteTable::from_prefilters(&config.prefilters)?;

        Ok(Self {
            config,
            path_prefilters,
            path_destinations,
            routes,
        })
    }

    /// Filters registered for a path template, in execution order.
    pub fn prefilters_for(&self, template: &str) -> &[Filter] {
        self.path_prefilters
            .get(template)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Destination URL for a template, or `default` when none is registered.
    pub fn destination_for<'a>(&'a self, template: &str, default: &'a str) -> &'a str {
        self.path_destinations
            .get(template)
            .map(|destination| destination.destination_url.as_str())
            .unwrap_or(default)
    }
}

/// Result of a reload call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// This call read the file and published a new snapshot.
    Applied,
    /// Another reload was in flight; this call did nothing.
    Skipped,
}

/// Owner of the live routing snapshot.
pub struct ConfigStore {
    path: PathBuf,
    default_destination: String,
    current: ArcSwap<RoutingSnapshot>,
    reloading: AtomicBool,
}

impl ConfigStore {
    /// Load the config file for the first time. Failure here is fatal to startup.
    pub fn load(
        path: impl Into<PathBuf>,
        default_destination: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let path = path.into();
        let snapshot = RoutingSnapshot::build(load_config(&path)?)?;

        tracing::info!(
            path = %path.display(),
            prefilters = snapshot.config.prefilters.len(),
            destinations = snapshot.config.destinations.len(),
            routes = snapshot.routes.len(),
            "Proxy config loaded"
        );

        Ok(Self {
            path,
            default_destination: default_destination.into(),
            current: ArcSwap::from_pointee(snapshot),
            reloading: AtomicBool::new(false),
        })
    }

    /// The current snapshot. Cheap; hold it for the duration of one request.
    pub fn get(&self) -> Arc<RoutingSnapshot> {
        self.current.load_full()
    }

    pub fn default_destination(&self) -> &str {
        &self.default_destination
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the config file and swap in a new snapshot.
    ///
    /// At most one reload runs at a time. A call that finds another reload in
    /// flight returns `Ok(ReloadOutcome::Skipped)` immediately instead of
    /// waiting. On error the live snapshot is left untouched.
    pub fn reload(&self) -> Result<ReloadOutcome, ConfigError> {
        let Some(_gate) = ReloadGate::try_acquire(&self.reloading) else {
            tracing::info!("Reload config is already in process, skipping");
            metrics::record_reload("skipped");
            return Ok(ReloadOutcome::Skipped);
        };

        let snapshot = match load_config(&self.path).and_then(RoutingSnapshot::build) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to reload proxy config");
                metrics::record_reload("failed");
                return Err(e);
            }
        };

        tracing::info!(
            prefilters = snapshot.config.prefilters.len(),
            destinations = snapshot.config.destinations.len(),
            routes = snapshot.routes.len(),
            "Proxy config reloaded"
        );
        self.current.store(Arc::new(snapshot));
        metrics::record_reload("applied");

        Ok(ReloadOutcome::Applied)
    }
}

/// Single-slot non-blocking gate; released on drop.
struct ReloadGate<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ReloadGate<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ReloadGate<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Barrier;

    fn filter(endpoint: &str, paths: &[&str]) -> Filter {
        Filter {
            name: "http".into(),
            endpoint: endpoint.into(),
            secret_token: String::new(),
            methods: vec!["GET".into()],
            paths: paths.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn write_config(file: &mut tempfile::NamedTempFile, body: &str) {
        file.as_file().set_len(0).unwrap();
        let mut handle = file.reopen().unwrap();
        handle.write_all(body.as_bytes()).unwrap();
        handle.flush().unwrap();
    }

    #[test]
    fn test_prefilter_order_across_entries() {
        let config = ConfigFileFields {
            prefilters: vec![
                filter("http://a", &["/x", "/y"]),
                filter("http://b", &["/y"]),
                filter("http://c", &["/x"]),
            ],
            destinations: vec![],
        };

        let snapshot = RoutingSnapshot::build(config).unwrap();
        let endpoints = |path: &str| -> Vec<String> {
            snapshot
                .prefilters_for(path)
                .iter()
                .map(|f| f.endpoint.clone())
                .collect()
        };

        assert_eq!(endpoints("/x"), vec!["http://a", "http://c"]);
        assert_eq!(endpoints("/y"), vec!["http://a", "http://b"]);
        assert!(snapshot.prefilters_for("/z").is_empty());
    }

    #[test]
    fn test_destination_last_write_wins() {
        let config = ConfigFileFields {
            prefilters: vec![],
            destinations: vec![
                Destination { destination_url: "http://first".into(), paths: vec!["/x".into()] },
                Destination {
                    destination_url: "http://second".into(),
                    paths: vec!["/x".into(), "/y".into()],
                },
            ],
        };

        let snapshot = RoutingSnapshot::build(config).unwrap();
        assert_eq!(snapshot.path_destinations["/x"].destination_url, "http://second");
        assert_eq!(snapshot.destination_for("/x", "http://default"), "http://second");
        assert_eq!(snapshot.destination_for("/nope", "http://default"), "http://default");
    }

    #[test]
    fn test_destination_only_path_is_not_routable() {
        let config = ConfigFileFields {
            prefilters: vec![],
            destinations: vec![Destination {
                destination_url: "http://d".into(),
                paths: vec!["/only-dest".into()],
            }],
        };

        let snapshot = RoutingSnapshot::build(config).unwrap();
        assert!(snapshot.routes.is_empty());
    }

    #[test]
    fn test_startup_load_fails_without_file() {
        let result = ConfigStore::load("/nonexistent/config.json", "http://default");
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_failed_reload_keeps_previous_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write_config(
            &mut file,
            r#"{"Prefilters": [{"name": "http", "endpoint": "http://a", "methods": ["get"], "paths": ["/x"]}],
                "Destinations": [{"destinationURL": "http://d", "paths": ["/x"]}]}"#,
        );

        let store = ConfigStore::load(file.path(), "http://default").unwrap();
        let before = store.get();

        write_config(&mut file, "{ not json");
        assert!(matches!(store.reload(), Err(ConfigError::Parse(_))));

        write_config(
            &mut file,
            r#"{"Prefilters": [{"name": "http", "endpoint": "http://a", "methods": ["NOT VALID"], "paths": ["/x"]}]}"#,
        );
        assert!(matches!(store.reload(), Err(ConfigError::InvalidMethod { .. })));

        write_config(
            &mut file,
            r#"{"Prefilters": [{"name": "http", "endpoint": "http://a", "methods": ["GET"], "paths": ["/x/{id:[0-9}"]}]}"#,
        );
        assert!(matches!(store.reload(), Err(ConfigError::InvalidPathPattern { .. })));

        let after = store.get();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(before.config, after.config);
        assert_eq!(before.path_prefilters, after.path_prefilters);
        assert_eq!(before.path_destinations, after.path_destinations);
    }

    #[test]
    fn test_reload_applies_new_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write_config(&mut file, r#"{"Prefilters": [], "Destinations": []}"#);
        let store = ConfigStore::load(file.path(), "http://default").unwrap();
        assert!(store.get().routes.is_empty());

        write_config(
            &mut file,
            r#"{"Prefilters": [{"name": "http", "endpoint": "http://a", "methods": ["post"], "paths": ["/x"]}]}"#,
        );
        assert_eq!(store.reload().unwrap(), ReloadOutcome::Applied);

        let snapshot = store.get();
        assert_eq!(snapshot.routes.len(), 1);
        assert_eq!(snapshot.prefilters_for("/x")[0].endpoint, "http://a");
    }

    #[test]
    fn test_reload_skipped_while_in_flight() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write_config(&mut file, "{}");
        let store = ConfigStore::load(file.path(), "http://default").unwrap();

        let held = ReloadGate::try_acquire(&store.reloading).unwrap();
        assert_eq!(store.reload().unwrap(), ReloadOutcome::Skipped);
        drop(held);
        assert_eq!(store.reload().unwrap(), ReloadOutcome::Applied);
    }

    #[test]
    fn test_concurrent_reloads_stay_consistent() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write_config(
            &mut file,
            r#"{"Prefilters": [{"name": "http", "endpoint": "http://a", "methods": ["get"], "paths": ["/x"]}],
                "Destinations": [{"destinationURL": "http://d", "paths": ["/x"]}]}"#,
        );
        let store = Arc::new(ConfigStore::load(file.path(), "http://default").unwrap());

        const CALLERS: usize = 8;
        let barrier = Arc::new(Barrier::new(CALLERS));
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let store = store.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    store.reload().unwrap()
                })
            })
            .collect();

        let applied = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|outcome| *outcome == ReloadOutcome::Applied)
            .count();
        assert!(applied >= 1 && applied <= CALLERS);

        let snapshot = store.get();
        let rebuilt = RoutingSnapshot::build(snapshot.config.clone()).unwrap();
        assert_eq!(snapshot.path_prefilters, rebuilt.path_prefilters);
        assert_eq!(snapshot.path_destinations, rebuilt.path_destinations);
        assert_eq!(snapshot.routes.len(), rebuilt.routes.len());
    }
}
