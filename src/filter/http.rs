//! Built-in `"http"` filter kind: JSON over a synchronous HTTP POST.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::config::schema::Filter;
use crate::error::FilterError;
use crate::filter::invoker::FilterInvoker;
use crate::filter::types::{ApiRequestData, FilterResponseData};

/// Calls a filter by POSTing [`ApiRequestData`] to its endpoint.
///
/// The filter's `secretToken` is not sent.
#[derive(Debug, Clone)]
pub struct HttpFilterInvoker {
    client: reqwest::Client,
}

impl HttpFilterInvoker {
    pub const KIND: &'static str = "http";

    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build with a dedicated client bounded by `timeout` per callout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl FilterInvoker for HttpFilterInvoker {
    async fn invoke(
        &self,
        filter: &Filter,
        request: &ApiRequestData,
    ) -> Result<FilterResponseData, FilterError> {
        let transport = |reason: String| FilterError::Transport {
            endpoint: filter.endpoint.clone(),
            reason,
        };

        let payload = serde_json::to_vec(request).map_err(|e| transport(e.to_string()))?;
        tracing::debug!(
            endpoint = %filter.endpoint,
            request = %String::from_utf8_lossy(&payload),
            "Filter request"
        );

        let response = self
            .client
            .post(&filter.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| transport(e.to_string()))?;

        let status = response.status().as_u16();
        let content = response.bytes().await.map_err(|e| transport(e.to_string()))?;
        tracing::debug!(
            endpoint = %filter.endpoint,
            status,
            response = %String::from_utf8_lossy(&content),
            "Filter response"
        );

        let mut data = decode_response(status, &content).map_err(|e| transport(e.to_string()))?;
        data.status = status;
        Ok(data)
    }
}

/// Decode a filter answer. Only a 200 needs a well-formed body; for anything
/// else the status alone decides and the body is ignored.
fn decode_response(status: u16, content: &[u8]) -> Result<FilterResponseData, serde_json::Error> {
    if content.iter().all(u8::is_ascii_whitespace) {
        return Ok(FilterResponseData::default());
    }
    match serde_json::from_slice(content) {
        Ok(data) => Ok(data),
        Err(_) if status != 200 => Ok(FilterResponseData::default()),
        Err(e) => Err(e),
    }
}
