//! Prefilter chain execution.
//!
//! Filters for a path run strictly one after another in the order they were
//! registered by the last successful reload. Each filter sees the body and
//! headers as left by the filters before it.
//!
//! A 200 answer merges by presence: a non-empty `body` or `headers` replaces
//! the current one, an absent or empty one leaves it as is. Any other status
//! stops the chain and is handed back to the client unchanged. Filters after
//! the failing one are never called.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::store::RoutingSnapshot;
use crate::error::FilterError;
use crate::filter::invoker::InvokerRegistry;
use crate::filter::types::{extract_env_id, ApiRequestData, FilterHeaders, JsonBody};
use crate::observability::metrics;

/// Input to one chain run.
#[derive(Debug, Clone)]
pub struct ChainRequest {
    /// Route template the request matched.
    pub template: String,
    /// Raw request path.
    pub api_path: String,
    pub body: Option<JsonBody>,
    pub headers: FilterHeaders,
}

/// Result of a chain that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    pub body: Option<JsonBody>,
    pub headers: FilterHeaders,
    pub destination: String,
}

/// Runs prefilter chains against a routing snapshot.
#[derive(Debug, Clone)]
pub struct FilterChainExecutor {
    registry: Arc<InvokerRegistry>,
}

impl FilterChainExecutor {
    pub fn new(registry: Arc<InvokerRegistry>) -> Self {
        Self { registry }
    }

    /// Run every filter registered for `request.template`, then resolve the destination.
    pub async fn execute(
        &self,
        snapshot: &RoutingSnapshot,
        default_destination: &str,
        request: ChainRequest,
    ) -> Result<ChainOutcome, FilterError> {
        let ChainRequest {
            template,
            api_path,
            mut body,
            mut headers,
        } = request;

        let prefilters = snapshot.prefilters_for(&template);
        let uuid = Uuid::new_v4().to_string();
        let env_id = extract_env_id(&api_path).to_string();

        tracing::debug!(
            path = %template,
            filters = prefilters.len(),
            uuid = %uuid,
            "START -- Processing pre filters"
        );

        for filter in prefilters {
            let invoker = self.registry.get(&filter.name).ok_or_else(|| {
                tracing::error!(filter = %filter.name, path = %template, "Unknown filter kind");
                metrics::record_filter_call(&filter.name, "unknown_kind");
                FilterError::UnknownKind {
                    name: filter.name.clone(),
                }
            })?;

            let request_data = ApiRequestData {
                headers: headers.clone(),
                body: body.clone(),
                uuid: uuid.clone(),
                api_path: api_path.clone(),
                env_id: env_id.clone(),
            };

            tracing::debug!(filter = %filter.name, endpoint = %filter.endpoint, path = %template, "Processing pre filter");

            let response = match invoker.invoke(filter, &request_data).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(endpoint = %filter.endpoint, error = %e, "Error processing the filter");
                    metrics::record_filter_call(&filter.name, "error");
                    return Err(e);
                }
            };

            if response.status != 200 {
                tracing::warn!(
                    endpoint = %filter.endpoint,
                    status = response.status,
                    "Filter rejected request"
                );
                metrics::record_filter_call(&filter.name, "rejected");
                return Err(FilterError::Rejected {
                    status: response.status,
                    endpoint: filter.endpoint.clone(),
                });
            }

            metrics::record_filter_call(&filter.name, "ok");
            if let Some(new_body) = response.body.filter(|b| !b.is_empty()) {
                body = Some(new_body);
            }
            if let Some(new_headers) = response.headers.filter(|h| !h.is_empty()) {
                headers = new_headers;
            }
        }

        let destination = snapshot
            .destination_for(&template, default_destination)
            .to_string();

        tracing::debug!(
            path = %template,
            destination = %destination,
            "DONE -- Processing pre filters"
        );

        Ok(ChainOutcome {
            body,
            headers,
            destination,
        })
    }
}
