//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the routing config (fatal on failure)
//! - Build the filter invoker registry
//! - Start optional background tasks (metrics exporter, file watcher, SIGHUP)
//! - Bind the listener and serve until shutdown

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ConfigError, ConfigStore, ConfigWatcher, ProxySettings};
use crate::filter::{HttpFilterInvoker, InvokerRegistry};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// Errors that stop the proxy before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to load the proxy config: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build the filter HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Failed to watch the config file: {0}")]
    Watch(#[from] notify::Error),

    #[error("Failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Start every subsystem and serve until Ctrl+C / SIGTERM.
pub async fn run(settings: ProxySettings) -> Result<(), StartupError> {
    let store = Arc::new(ConfigStore::load(
        &settings.config_path,
        settings.default_destination.clone(),
    )?);

    let http = HttpFilterInvoker::with_timeout(Duration::from_secs(settings.filter_timeout_secs))?;
    let registry = Arc::new(InvokerRegistry::with_builtin(http));

    if let Some(address) = &settings.metrics_address {
        match address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(metrics_address = %address, "Failed to parse metrics address"),
        }
    }

    // Dropping the watcher stops it, so it lives until the server returns.
    let _watcher = if settings.watch_config {
        Some(ConfigWatcher::new(store.clone()).run()?)
    } else {
        None
    };

    signals::spawn_reload_on_hangup(store.clone()).map_err(StartupError::Signal)?;

    let listener = TcpListener::bind(&settings.listen_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: settings.listen_address.clone(),
            source,
        })?;
    tracing::info!(
        address = %settings.listen_address,
        default_destination = %settings.default_destination,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(&settings, store, registry);
    server
        .run(listener, server_shutdown)
        .await
        .map_err(StartupError::Serve)?;

    Ok(())
}
