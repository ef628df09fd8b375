//! Request handling and transformation.
//!
//! # Responsibilities
//! - Convert inbound headers into the map filters receive
//! - Convert the post-chain header map back into an outbound `HeaderMap`
//! - Decode the inbound body as a JSON object for the chain
//!
//! # Design Decisions
//! - Filters see MIME-canonical header names (`X-Api-Key`), whatever case
//!   the client or HTTP/2 used
//! - Headers a filter hands back that are not valid HTTP are dropped with a
//!   warning rather than failing the request
//! - `Content-Length` is never carried over; it is recomputed for the
//!   rewritten body
//! - `Host` is never carried over either, so a rebuilt request names the
//!   destination it is sent to

use axum::body::Bytes;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::error::ProxyError;
use crate::filter::types::{FilterHeaders, JsonBody};

/// Canonical MIME header form: first letter and letters after `-` upper-cased.
pub fn canonical_header_key(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let mapped = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            mapped
        })
        .collect()
}

/// Inbound headers as filters see them.
pub fn to_filter_headers(headers: &HeaderMap) -> FilterHeaders {
    let mut map = FilterHeaders::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            tracing::debug!(header = %name, "Skipping non-text header value");
            continue;
        };
        map.entry(canonical_header_key(name.as_str()))
            .or_default()
            .push(value.to_string());
    }
    map
}

/// Post-chain headers as they go to the destination.
pub fn to_header_map(headers: &FilterHeaders) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, values) in headers {
        let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
            tracing::warn!(header = %name, "Dropping invalid header name from filter chain");
            continue;
        };
        if header_name == header::CONTENT_LENGTH || header_name == header::HOST {
            continue;
        }
        for value in values {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    map.append(header_name.clone(), value);
                }
                Err(_) => {
                    tracing::warn!(header = %name, "Dropping invalid header value from filter chain");
                }
            }
        }
    }
    map
}

/// Decode a request body for the chain. An empty body is `None`.
pub fn parse_json_body(bytes: &Bytes) -> Result<Option<JsonBody>, ProxyError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice::<JsonBody>(bytes)
        .map(Some)
        .map_err(|e| {
            tracing::error!(error = %e, "Error unmarshalling json request body");
            ProxyError::bad_request(format!("Error reading json request body: {e}"))
        })
}
