//! Storage configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::limits::PathLimits;

/// Default external URI scheme.
pub const DEFAULT_SCHEME: &str = "blobfs";

/// Default name of the zero-length object marking a directory.
pub const DEFAULT_MARKER_NAME: &str = ".blobfsdir";

/// Configuration for a [`Storage`](crate::Storage).
///
/// Deserializable so it can be embedded in a host application's own
/// configuration file; missing fields take their defaults.
///
/// # Example
///
/// ```rust
/// use blobfs::StorageConfig;
///
/// let config: StorageConfig = serde_json::from_str(r#"{"scheme": "assets"}"#).unwrap();
/// assert_eq!(config.scheme, "assets");
/// assert_eq!(config.marker_name, ".blobfsdir");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Scheme of external URIs (`<scheme>://<path>`).
    pub scheme: String,

    /// Name of the directory marker object.
    ///
    /// Changing this on a populated store makes existing directories
    /// invisible.
    pub marker_name: String,

    /// Limits applied to every incoming path.
    pub limits: PathLimits,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            marker_name: DEFAULT_MARKER_NAME.to_string(),
            limits: PathLimits::default(),
        }
    }
}

impl StorageConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the external URI scheme.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Set the directory marker name.
    pub fn marker_name(mut self, name: impl Into<String>) -> Self {
        self.marker_name = name.into();
        self
    }

    /// Set the path limits.
    pub fn limits(mut self, limits: PathLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Check that the configuration can produce well-formed keys and URIs.
    pub fn validate(&self) -> Result<()> {
        let scheme_ok = !self.scheme.is_empty()
            && self
                .scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !scheme_ok {
            return Err(Error::invalid_path(&self.scheme, "invalid uri scheme"));
        }

        let name = self.marker_name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains('/') {
            return Err(Error::invalid_path(name, "invalid directory marker name"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = StorageConfig::default();
        assert_eq!(config.scheme, "blobfs");
        assert_eq!(config.marker_name, ".blobfsdir");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_marker_names() {
        for name in ["", ".", "..", "a/b"] {
            let config = StorageConfig::new().marker_name(name);
            assert!(config.validate().is_err(), "accepted marker name {name:?}");
        }
    }

    #[test]
    fn rejects_bad_schemes() {
        for scheme in ["", "has space", "a:b", "x/y"] {
            let config = StorageConfig::new().scheme(scheme);
            assert!(config.validate().is_err(), "accepted scheme {scheme:?}");
        }
        assert!(StorageConfig::new().scheme("s3+https").validate().is_ok());
    }

    #[test]
    fn deserializes_partial_config() {
        let config: StorageConfig = serde_json::from_str(
            r#"{"marker_name": ".dir", "limits": {"max_path_depth": 8}}"#,
        )
        .unwrap();
        assert_eq!(config.scheme, "blobfs");
        assert_eq!(config.marker_name, ".dir");
        assert_eq!(config.limits.max_path_depth, 8);
        assert_eq!(config.limits.max_segment_length, 255);
    }
}
