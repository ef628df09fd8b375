//! Shared utilities for integration testing.

use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use api_filter_proxy::config::{ConfigStore, ProxySettings};
use api_filter_proxy::filter::{HttpFilterInvoker, InvokerRegistry};
use api_filter_proxy::http::HttpServer;
use api_filter_proxy::lifecycle::Shutdown;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral local port.
pub async fn spawn_app(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A destination that answers every request with a JSON description of it.
#[derive(Clone, Default)]
pub struct EchoDestination {
    pub hits: Arc<Mutex<usize>>,
}

impl EchoDestination {
    pub async fn start(name: &'static str) -> (Self, String) {
        let echo = Self::default();
        let hits = echo.hits.clone();
        let app = Router::new().fallback(
            move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
                let hits = hits.clone();
                async move {
                    *hits.lock().unwrap() += 1;
                    let headers: serde_json::Map<String, Value> = headers
                        .iter()
                        .map(|(k, v)| (k.to_string(), json!(v.to_str().unwrap_or_default())))
                        .collect();
                    Json(json!({
                        "destination": name,
                        "method": method.as_str(),
                        "uri": uri.to_string(),
                        "headers": headers,
                        "body": String::from_utf8_lossy(&body),
                    }))
                }
            },
        );
        let addr = spawn_app(app).await;
        (echo, format!("http://{addr}"))
    }

    pub fn hits(&self) -> usize {
        *self.hits.lock().unwrap()
    }
}

/// A filter that records what it receives and answers with a fixed reply.
#[derive(Clone)]
pub struct MockFilter {
    pub calls: Arc<Mutex<Vec<Value>>>,
    status: StatusCode,
    reply: Value,
}

impl MockFilter {
    pub async fn start(status: u16, reply: Value) -> (Self, String) {
        let filter = Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            status: StatusCode::from_u16(status).unwrap(),
            reply,
        };
        let app = Router::new()
            .route("/filter", post(handle_filter))
            .with_state(filter.clone());
        let addr = spawn_app(app).await;
        (filter, format!("http://{addr}/filter"))
    }

    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().unwrap().clone()
    }
}

async fn handle_filter(
    State(filter): State<MockFilter>,
    Json(request): Json<Value>,
) -> (StatusCode, Json<Value>) {
    filter.calls.lock().unwrap().push(request);
    (filter.status, Json(filter.reply.clone()))
}

/// A running proxy plus the handles a test needs to drive it.
pub struct TestProxy {
    pub url: String,
    pub config: tempfile::NamedTempFile,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestProxy {
    pub async fn start(config: &Value, default_destination: &str) -> Self {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_string().as_bytes()).unwrap();

        let settings = ProxySettings {
            config_path: file.path().to_path_buf(),
            default_destination: default_destination.to_string(),
            ..Default::default()
        };
        let store = Arc::new(
            ConfigStore::load(&settings.config_path, settings.default_destination.clone()).unwrap(),
        );
        let registry = Arc::new(InvokerRegistry::with_builtin(HttpFilterInvoker::new(
            reqwest::Client::builder().no_proxy().build().unwrap(),
        )));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        let server = HttpServer::new(&settings, store, registry);
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        Self {
            url: format!("http://{addr}"),
            config: file,
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
            shutdown,
        }
    }

    /// Replace the config file contents (not yet reloaded).
    pub fn rewrite_config(&self, contents: &str) {
        let file = self.config.as_file();
        file.set_len(0).unwrap();
        let mut handle = self.config.reopen().unwrap();
        handle.write_all(contents.as_bytes()).unwrap();
        handle.flush().unwrap();
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
