//! Filter callout payloads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Header name → values, as exchanged with filters.
pub type FilterHeaders = HashMap<String, Vec<String>>;

/// A JSON object body. Kept untyped so filters and destinations can send anything.
pub type JsonBody = Map<String, Value>;

/// Payload POSTed to each filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequestData {
    #[serde(default)]
    pub headers: FilterHeaders,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<JsonBody>,

    /// Generated once per inbound request, shared by every filter in the chain.
    pub uuid: String,

    /// Raw request path.
    pub api_path: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub env_id: String,
}

/// What a filter answers with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterResponseData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<FilterHeaders>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<JsonBody>,

    /// Transport-level status of the callout. Any `status` field in the
    /// filter's JSON is ignored and replaced with the real HTTP status.
    #[serde(skip_deserializing)]
    pub status: u16,
}

/// Extract the identifier following `/projects/` in an API path.
///
/// Returns an empty string when the path has no `/projects/` segment.
pub fn extract_env_id(api_path: &str) -> &str {
    match api_path.split_once("/projects/") {
        Some((_, rest)) => rest.split('/').next().unwrap_or(""),
        None => "",
    }
}
