//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum Router with the admin reload route and the proxy fallback
//! - Wire up middleware (tracing, timeout, request ID)
//! - Match each request against the current routing snapshot
//! - Run the prefilter chain for matched requests, then forward
//! - Forward unmatched requests untouched to the default destination

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ConfigStore, ProxySettings, ReloadOutcome, RoutingSnapshot};
use crate::error::ProxyError;
use crate::filter::{ChainRequest, FilterChainExecutor, InvokerRegistry};
use crate::http::request::{parse_json_body, to_filter_headers, to_header_map};
use crate::observability::metrics;
use crate::proxy::ProxyDispatcher;

/// Administrative route that re-reads the routing config.
pub const RELOAD_PATH: &str = "/v1-api-filter-proxy/reload";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ConfigStore>,
    pub executor: FilterChainExecutor,
    pub dispatcher: ProxyDispatcher,
    pub max_body_bytes: usize,
}

/// HTTP server for the filter proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around a loaded config store.
    pub fn new(
        settings: &ProxySettings,
        store: Arc<ConfigStore>,
        registry: Arc<InvokerRegistry>,
    ) -> Self {
        let state = AppState {
            store,
            executor: FilterChainExecutor::new(registry),
            dispatcher: ProxyDispatcher::new(),
            max_body_bytes: settings.max_body_bytes,
        };

        let router = Self::build_router(settings, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(settings: &ProxySettings, state: AppState) -> Router {
        Router::new()
            .route(RELOAD_PATH, post(reload_handler).fallback(proxy_handler))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(settings.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// `POST` on the reload route.
async fn reload_handler(State(state): State<AppState>) -> Response {
    tracing::info!("Reload proxy config");

    let store = state.store.clone();
    let message = match tokio::task::spawn_blocking(move || store.reload()).await {
        Ok(Ok(ReloadOutcome::Applied)) => "Proxy config reloaded",
        Ok(Ok(ReloadOutcome::Skipped)) => "Reload already in progress, skipped",
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "Reload failed");
            return ProxyError::internal("Failed to reload the proxy config").into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Reload task failed");
            return ProxyError::internal("Failed to reload the proxy config").into_response();
        }
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "200", "message": message })),
    )
        .into_response()
}

/// Every client-facing request.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    // One snapshot for the whole request, from route match to destination.
    let snapshot = state.store.get();

    let template = snapshot
        .routes
        .match_route(request.method(), request.uri().path())
        .map(str::to_string);

    let (route, result) = match template {
        Some(template) => {
            tracing::debug!(path = %template, "Request path matched");
            let route = template.clone();
            (route, handle_filtered(&state, &snapshot, template, request).await)
        }
        None => ("default".to_string(), handle_unmatched(&state, request).await),
    };

    let response = result.unwrap_or_else(|e| e.into_response());
    metrics::record_request(&route, response.status().as_u16(), start);
    response
}

async fn handle_filtered(
    state: &AppState,
    snapshot: &RoutingSnapshot,
    template: String,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();

    let bytes = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|e| {
            tracing::error!(path = %template, error = %e, "Error reading request body");
            ProxyError::bad_request(format!("Error reading json request body, err: {e}"))
        })?;

    let chain_request = ChainRequest {
        template,
        api_path: parts.uri.path().to_string(),
        body: parse_json_body(&bytes)?,
        headers: to_filter_headers(&parts.headers),
    };

    let outcome = state
        .executor
        .execute(snapshot, state.store.default_destination(), chain_request)
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "Error from proxy filter");
            ProxyError::from(e)
        })?;

    let payload = match &outcome.body {
        Some(body) => serde_json::to_vec(body)
            .map_err(|e| ProxyError::internal(format!("Error encoding request body: {e}")))?,
        None => Vec::new(),
    };

    let mut outbound = Request::builder()
        .method(parts.method)
        .uri(parts.uri.clone())
        .body(Body::from(payload))
        .map_err(|e| {
            tracing::error!(uri = %parts.uri, error = %e, "Error creating new request");
            ProxyError::bad_request(format!(
                "Error creating new request for path {} to send to destination",
                parts.uri
            ))
        })?;
    *outbound.headers_mut() = to_header_map(&outcome.headers);
    if let Some(connect_info) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        outbound.extensions_mut().insert(connect_info.clone());
    }

    state
        .dispatcher
        .forward(&outcome.destination, outbound)
        .await
        .map_err(|e| {
            tracing::error!(destination = %outcome.destination, error = %e, "Error proxying to destination");
            ProxyError::from(e)
        })
}

async fn handle_unmatched(
    state: &AppState,
    mut request: Request<Body>,
) -> Result<Response, ProxyError> {
    let destination = state.store.default_destination();

    // Untouched requests keep the client's Host. HTTP/2 clients carry it in
    // the URI authority instead of a header.
    if !request.headers().contains_key(header::HOST) {
        let authority = request
            .uri()
            .authority()
            .and_then(|authority| HeaderValue::from_str(authority.as_str()).ok());
        if let Some(host) = authority {
            request.headers_mut().insert(header::HOST, host);
        }
    }

    tracing::debug!(
        path = %request.uri().path(),
        destination = %destination,
        "Request path NOT matched to proxy config"
    );

    state
        .dispatcher
        .forward(destination, request)
        .await
        .map_err(|e| {
            tracing::error!(destination = %destination, error = %e, "Error proxying to default destination");
            ProxyError::from(e)
        })
}
