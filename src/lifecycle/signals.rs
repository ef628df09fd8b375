//! OS signal handling.
//!
//! - SIGINT / SIGTERM → graceful shutdown
//! - SIGHUP → config reload (same skip-if-busy gate as the admin route)

use std::sync::Arc;

use crate::config::ConfigStore;

/// Resolves when the process is asked to terminate.
pub async fn terminate() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let term = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let term = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = term => {},
    }
}

/// Reload `store` on every SIGHUP.
#[cfg(unix)]
pub fn spawn_reload_on_hangup(store: Arc<ConfigStore>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            tracing::info!("SIGHUP received, reloading proxy config");
            let store = store.clone();
            // Failures are logged by the store and leave the live config in place.
            let _ = tokio::task::spawn_blocking(move || store.reload()).await;
        }
    });
    Ok(())
}

#[cfg(not(unix))]
pub fn spawn_reload_on_hangup(_store: Arc<ConfigStore>) -> std::io::Result<()> {
    Ok(())
}
