//! Forwarding to the resolved destination.
//!
//! # Responsibilities
//! - Bind a single-host proxy to the destination picked for this request
//! - Rewrite the request URI onto the destination (path joined, query merged)
//! - Strip hop-by-hop headers in both directions, append `X-Forwarded-For`
//! - Leave `Host` as the caller set it; without one, the client derives it
//!   from the destination
//! - Stream the upstream response back without buffering it
//!
//! # Design Decisions
//! - One pooled HTTP client shared by all requests; the per-request
//!   `SingleHostProxy` is only a parsed target, so building it is cheap
//! - Response bodies are forwarded frame by frame as they arrive, so
//!   chunked and streaming backends reach the client immediately
//! - Upstream failures become 502 Bad Gateway

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{
        header::{self, HeaderMap, HeaderName, HeaderValue},
        Request, Response, Uri, Version,
    },
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::error::DispatchError;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "proxy-connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Shared forwarding client.
#[derive(Clone)]
pub struct ProxyDispatcher {
    client: Client<HttpConnector, Body>,
}

impl ProxyDispatcher {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client }
    }

    /// Forward `request` to `destination` and return the streaming response.
    pub async fn forward(
        &self,
        destination: &str,
        request: Request<Body>,
    ) -> Result<Response<Body>, DispatchError> {
        let proxy = SingleHostProxy::new(destination)?;
        proxy.serve(&self.client, request).await
    }
}

impl Default for ProxyDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// A reverse proxy bound to one destination.
#[derive(Debug, Clone)]
pub struct SingleHostProxy {
    target: Url,
}

impl SingleHostProxy {
    pub fn new(destination: &str) -> Result<Self, DispatchError> {
        let invalid = |reason: String| DispatchError::InvalidDestination {
            destination: destination.to_string(),
            reason,
        };

        let target = Url::parse(destination).map_err(|e| invalid(e.to_string()))?;
        if target.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }

        Ok(Self { target })
    }

    /// Map an inbound URI onto the destination.
    pub fn rewrite_uri(&self, uri: &Uri) -> Result<Uri, DispatchError> {
        let host = self.target.host_str().unwrap_or_default();
        let authority = match self.target.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let path = single_joining_slash(self.target.path(), uri.path());
        let query = [self.target.query(), uri.query()]
            .into_iter()
            .flatten()
            .filter(|q| !q.is_empty())
            .collect::<Vec<_>>()
            .join("&");
        let path_and_query = if query.is_empty() {
            path
        } else {
            format!("{path}?{query}")
        };

        Uri::builder()
            .scheme(self.target.scheme())
            .authority(authority)
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| DispatchError::InvalidDestination {
                destination: self.target.to_string(),
                reason: e.to_string(),
            })
    }

    async fn serve(
        &self,
        client: &Client<HttpConnector, Body>,
        mut request: Request<Body>,
    ) -> Result<Response<Body>, DispatchError> {
        *request.uri_mut() = self.rewrite_uri(request.uri())?;
        *request.version_mut() = Version::HTTP_11;

        let client_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let headers = request.headers_mut();
        remove_hop_by_hop(headers);
        if let Some(ip) = client_addr {
            append_forwarded_for(headers, &ip.to_string());
        }

        tracing::debug!(uri = %request.uri(), method = %request.method(), "Forwarding request");

        let response: Response<hyper::body::Incoming> = client
            .request(request)
            .await
            .map_err(|e| DispatchError::Upstream(e.to_string()))?;

        let (mut parts, body) = response.into_parts();
        remove_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

fn single_joining_slash(a: &str, b: &str) -> String {
    match (a.ends_with('/'), b.starts_with('/')) {
        (true, true) => format!("{}{}", a, &b[1..]),
        (false, false) => format!("{a}/{b}"),
        _ => format!("{a}{b}"),
    }
}

fn remove_hop_by_hop(headers: &mut HeaderMap) {
    // Headers listed in Connection are hop-by-hop too.
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in &listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, ip: &str) {
    let prior: Vec<&str> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    let value = if prior.is_empty() {
        ip.to_string()
    } else {
        format!("{}, {}", prior.join(", "), ip)
    };

    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
