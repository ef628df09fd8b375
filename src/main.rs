//! API filter proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌────────────────────────────────────────────────────┐
//!                      │                  API FILTER PROXY                  │
//!   Client Request     │  ┌─────────┐   ┌───────────┐   matched             │
//!   ───────────────────┼─▶│  http   │──▶│  routing  │──────────┐            │
//!                      │  │ server  │   │  snapshot │          ▼            │
//!                      │  └─────────┘   └─────┬─────┘   ┌─────────────┐     │      ┌────────┐
//!                      │                      │         │ filter chain│─────┼─────▶│filters │
//!                      │            unmatched │         └──────┬──────┘     │      └────────┘
//!                      │                      ▼                ▼            │
//!   Client Response    │               ┌──────────────────────────────┐     │      ┌───────────┐
//!   ◀──────────────────┼───────────────│       proxy dispatcher       │─────┼─────▶│destination│
//!                      │               └──────────────────────────────┘     │      └───────────┘
//!                      │  ┌──────────────────────────────────────────────┐  │
//!                      │  │ config store (atomic snapshot, reload gate)  │  │
//!                      │  └──────────────────────────────────────────────┘  │
//!                      └────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use api_filter_proxy::config::ProxySettings;
use api_filter_proxy::lifecycle;
use api_filter_proxy::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "api-filter-proxy", version)]
#[command(about = "Reverse proxy applying API specific filters before forwarding", long_about = None)]
struct Cli {
    /// Path to the config.json file containing the API filter configuration
    #[arg(long, env = "FILTER_PROXY_CONFIG")]
    config: PathBuf,

    /// Default destination URL for any request paths not specified in config.json
    #[arg(long, env = "DEFAULT_DESTINATION", default_value = "")]
    default_destination: String,

    /// Cattle endpoint URL, used as default destination when none is given
    #[arg(long, env = "CATTLE_URL", default_value = "")]
    cattle_url: String,

    /// Address to listen to (TCP)
    #[arg(long, default_value = "0.0.0.0:8091")]
    listen: String,

    /// Enable debug logs
    #[arg(long)]
    debug: bool,

    /// Reload automatically when config.json changes on disk
    #[arg(long)]
    watch: bool,

    /// Upper bound on a whole client request, in seconds
    #[arg(long, default_value_t = 60)]
    request_timeout_secs: u64,

    /// Upper bound on a single filter call, in seconds
    #[arg(long, default_value_t = 30)]
    filter_timeout_secs: u64,

    /// Maximum request body size buffered for filters, in bytes
    #[arg(long, default_value_t = 10 * 1024 * 1024)]
    max_body_bytes: usize,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    metrics_address: Option<String>,
}

impl Cli {
    fn into_settings(self) -> Result<ProxySettings, String> {
        let default_destination = if !self.default_destination.is_empty() {
            self.default_destination
        } else if !self.cattle_url.is_empty() {
            tracing::info!("DEFAULT_DESTINATION is not set, will use CATTLE_URL as default");
            self.cattle_url
        } else {
            return Err("neither DEFAULT_DESTINATION nor CATTLE_URL is set".to_string());
        };

        Ok(ProxySettings {
            config_path: self.config,
            default_destination,
            listen_address: self.listen,
            request_timeout_secs: self.request_timeout_secs,
            filter_timeout_secs: self.filter_timeout_secs,
            max_body_bytes: self.max_body_bytes,
            watch_config: self.watch,
            metrics_address: self.metrics_address,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.debug);

    tracing::info!("api-filter-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let settings = cli.into_settings()?;
    lifecycle::run(settings).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
