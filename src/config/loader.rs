//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ConfigFileFields;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error reading config file at path {}: {source}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Proxy config data format invalid: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid HTTP method {method:?} in prefilter config")]
    InvalidMethod { method: String },

    #[error("Invalid path pattern in prefilter path {path}: {source}")]
    InvalidPathPattern {
        path: String,
        #[source]
        source: regex::Error,
    },
}

/// Read and parse the routing config file.
pub fn load_config(path: &Path) -> Result<ConfigFileFields, ConfigError> {
    let content = fs::read(path).map_err(|source| ConfigError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_json::from_slice(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/filter-proxy.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ \"Prefilters\": [ ").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"Prefilters": [{"name": "http", "endpoint": "http://f", "methods": ["get"], "paths": ["/a"]}], "Destinations": []}"#,
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.prefilters[0].methods, vec!["get"]);
    }
}
