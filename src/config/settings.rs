//! Process-level settings supplied at startup.

use std::path::PathBuf;

/// Startup parameters, already validated by the CLI layer.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// Path of the JSON routing config file.
    pub config_path: PathBuf,

    /// Fallback destination for paths without a registered destination.
    pub default_destination: String,

    /// Bind address (e.g., "0.0.0.0:8091").
    pub listen_address: String,

    /// Upper bound on a whole client request, in seconds.
    pub request_timeout_secs: u64,

    /// Upper bound on a single filter callout, in seconds.
    pub filter_timeout_secs: u64,

    /// Maximum inbound body size buffered for the filter chain.
    pub max_body_bytes: usize,

    /// Reload when the config file changes on disk.
    pub watch_config: bool,

    /// Prometheus exporter bind address, if enabled.
    pub metrics_address: Option<String>,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config.json"),
            default_destination: String::new(),
            listen_address: "0.0.0.0:8091".to_string(),
            request_timeout_secs: 60,
            filter_timeout_secs: 30,
            max_body_bytes: 10 * 1024 * 1024, // 10MB
            watch_config: false,
            metrics_address: None,
        }
    }
}
