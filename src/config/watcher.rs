//! Configuration file watcher for hot reload.

use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::store::{ConfigStore, ReloadOutcome};

/// Reloads a [`ConfigStore`] whenever its file changes on disk.
pub struct ConfigWatcher {
    store: Arc<ConfigStore>,
}

impl ConfigWatcher {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as watching should continue.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let store = self.store.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        match store.reload() {
                            Ok(ReloadOutcome::Applied) => {}
                            Ok(ReloadOutcome::Skipped) => {
                                tracing::info!("Reload already in progress, file change skipped")
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Config file change not applied, keeping live config")
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(self.store.path(), RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.store.path(), "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_file_change_reloads_store() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"Prefilters": []}"#).unwrap();

        let store = Arc::new(ConfigStore::load(file.path(), "http://default").unwrap());
        let _watcher = ConfigWatcher::new(store.clone()).run().unwrap();

        std::fs::write(
            file.path(),
            r#"{"Prefilters": [{"name": "http", "endpoint": "http://f", "methods": ["GET"], "paths": ["/x"]}]}"#,
        )
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while store.get().routes.is_empty() {
            assert!(Instant::now() < deadline, "config change was not picked up");
            std::thread::sleep(Duration::from_millis(50));
        }
        assert_eq!(store.get().routes.len(), 1);
    }

    #[test]
    fn test_broken_file_keeps_live_config() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"Prefilters": []}"#).unwrap();

        let store = Arc::new(ConfigStore::load(file.path(), "http://default").unwrap());
        let before = store.get();
        let _watcher = ConfigWatcher::new(store.clone()).run().unwrap();

        std::fs::write(file.path(), "{ broken").unwrap();
        std::thread::sleep(Duration::from_millis(500));

        assert!(Arc::ptr_eq(&before, &store.get()));
    }
}
