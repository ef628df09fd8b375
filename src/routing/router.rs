//! Route lookup.
//!
//! # Responsibilities
//! - Bind method + path template pairs declared by prefilters
//! - Look up the template a request resolves to
//! - Return the matched template or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction; replaced wholesale on reload
//! - Only prefilters create bindings; destination-only paths are reachable
//!   through the fallback alone
//! - First binding in declaration order wins
//! - O(n) scan (acceptable for typical route counts)

use axum::http::Method;

use crate::config::schema::Filter;
use crate::config::ConfigError;
use crate::routing::matcher::PathTemplate;

#[derive(Debug, Clone)]
struct RouteBinding {
    method: Method,
    template: PathTemplate,
}

/// Method + path bindings into the filter chain.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    bindings: Vec<RouteBinding>,
}

impl RouteTable {
    /// Build bindings for every filter × path × method, in declaration order.
    pub fn from_prefilters(prefilters: &[Filter]) -> Result<Self, ConfigError> {
        let mut bindings = Vec::new();

        for filter in prefilters {
            for path in &filter.paths {
                for method in &filter.methods {
                    let normalized = method.to_uppercase();
                    let method = Method::from_bytes(normalized.as_bytes())
                        .map_err(|_| ConfigError::InvalidMethod { method: method.clone() })?;

                    let template = PathTemplate::new(path.clone()).map_err(|source| {
                        ConfigError::InvalidPathPattern {
                            path: path.clone(),
                            source,
                        }
                    })?;

                    tracing::debug!(method = %method, path = %path, "Adding route");
                    bindings.push(RouteBinding { method, template });
                }
            }
        }

        Ok(Self { bindings })
    }

    /// Returns the template bound to `method` + `path`, if any.
    pub fn match_route(&self, method: &Method, path: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|binding| binding.method == *method && binding.template.matches(path))
            .map(|binding| binding.template.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(methods: &[&str], paths: &[&str]) -> Filter {
        Filter {
            name: "http".into(),
            endpoint: "http://filter".into(),
            methods: methods.iter().map(|m| m.to_string()).collect(),
            paths: paths.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_bindings_cover_every_method_and_path() {
        let table = RouteTable::from_prefilters(&[
            filter(&["get", "Post"], &["/a", "/b/{id}"]),
            filter(&["DELETE"], &["/c"]),
        ])
        .unwrap();

        assert_eq!(table.len(), 5);
        assert_eq!(table.match_route(&Method::GET, "/a"), Some("/a"));
        assert_eq!(table.match_route(&Method::POST, "/b/42"), Some("/b/{id}"));
        assert_eq!(table.match_route(&Method::DELETE, "/c"), Some("/c"));
        assert_eq!(table.match_route(&Method::DELETE, "/a"), None);
        assert_eq!(table.match_route(&Method::GET, "/d"), None);
    }

    #[test]
    fn test_first_declared_template_wins() {
        let table = RouteTable::from_prefilters(&[
            filter(&["GET"], &["/v1/{kind}/list"]),
            filter(&["GET"], &["/v1/hosts/list"]),
        ])
        .unwrap();

        assert_eq!(
            table.match_route(&Method::GET, "/v1/hosts/list"),
            Some("/v1/{kind}/list")
        );
    }

    #[test]
    fn test_invalid_method() {
        let result = RouteTable::from_prefilters(&[filter(&["NOT A METHOD"], &["/a"])]);
        assert!(matches!(result, Err(ConfigError::InvalidMethod { .. })));
    }

    #[test]
    fn test_patterns_pick_between_similar_templates() {
        let table = RouteTable::from_prefilters(&[
            filter(&["GET"], &["/x/{id:[0-9]+}"]),
            filter(&["GET"], &["/x/{name:[a-z]+}"]),
        ])
        .unwrap();

        assert_eq!(table.match_route(&Method::GET, "/x/42"), Some("/x/{id:[0-9]+}"));
        assert_eq!(table.match_route(&Method::GET, "/x/abc"), Some("/x/{name:[a-z]+}"));
        assert_eq!(table.match_route(&Method::GET, "/x/ABC"), None);
    }

    #[test]
    fn test_invalid_path_pattern() {
        let result = RouteTable::from_prefilters(&[filter(&["GET"], &["/x/{id:(}"])]);
        assert!(matches!(result, Err(ConfigError::InvalidPathPattern { .. })));
    }

    #[test]
    fn test_empty_table() {
        let table = RouteTable::from_prefilters(&[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.match_route(&Method::GET, "/"), None);
    }
}
