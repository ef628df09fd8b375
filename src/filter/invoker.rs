//! Filter invocation strategies, dispatched by kind name.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::schema::Filter;
use crate::error::FilterError;
use crate::filter::http::HttpFilterInvoker;
use crate::filter::types::{ApiRequestData, FilterResponseData};

/// One way of calling a filter.
///
/// Implementations return the filter's answer with `status` set to the
/// transport-level status. Only transport or decoding problems are errors;
/// a non-200 answer is a normal return value.
#[async_trait]
pub trait FilterInvoker: Send + Sync {
    async fn invoke(
        &self,
        filter: &Filter,
        request: &ApiRequestData,
    ) -> Result<FilterResponseData, FilterError>;
}

/// Kind name → invocation strategy. Populated at startup, read-only afterwards.
#[derive(Clone, Default)]
pub struct InvokerRegistry {
    invokers: HashMap<String, Arc<dyn FilterInvoker>>,
}

impl InvokerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in `"http"` strategy.
    pub fn with_builtin(http: HttpFilterInvoker) -> Self {
        let mut registry = Self::new();
        registry.register(HttpFilterInvoker::KIND, Arc::new(http));
        registry
    }

    /// Register (or replace) the strategy for `kind`.
    pub fn register(&mut self, kind: impl Into<String>, invoker: Arc<dyn FilterInvoker>) {
        let kind = kind.into();
        tracing::debug!(kind = %kind, "Registered filter invoker");
        self.invokers.insert(kind, invoker);
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn FilterInvoker>> {
        self.invokers.get(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.invokers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for InvokerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvokerRegistry")
            .field("kinds", &self.kinds().collect::<Vec<_>>())
            .finish()
    }
}
