//! Routing configuration schema.
//!
//! These types mirror the JSON config file one-to-one. The file is loaded
//! wholesale on startup and on every reload; nothing here is mutated in place.

use serde::{Deserialize, Serialize};

/// Root of the routing config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConfigFileFields {
    /// Ordered prefilter definitions. Declaration order is execution order.
    #[serde(rename = "Prefilters", alias = "prefilters", default)]
    pub prefilters: Vec<Filter>,

    /// Ordered destination definitions. Later entries win on path collisions.
    #[serde(rename = "Destinations", alias = "destinations", default)]
    pub destinations: Vec<Destination>,
}

/// An externally hosted filter service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    /// Invocation strategy kind (e.g. `"http"`), resolved through the invoker registry.
    #[serde(default)]
    pub name: String,

    /// URL the filter is reachable at.
    #[serde(default)]
    pub endpoint: String,

    /// Opaque credential. Not attached to callouts by the built-in strategy.
    #[serde(default)]
    pub secret_token: String,

    /// HTTP verbs this filter applies to (case-insensitive).
    #[serde(default)]
    pub methods: Vec<String>,

    /// Path templates this filter applies to.
    #[serde(default)]
    pub paths: Vec<String>,
}

/// A backend requests are proxied to once the chain completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Destination {
    #[serde(rename = "destinationURL", alias = "destinationUrl")]
    pub destination_url: String,

    #[serde(default)]
    pub paths: Vec<String>,
}
