//! Mapping between external URIs and tenant-scoped store keys.
//!
//! External URIs look like `blobfs:///ns/file.txt` (or plain `/ns/file.txt`)
//! and never contain a tenant segment. Store keys are absolute and, when a
//! tenant is present, start with it: `/main/ns/file.txt`.
//!
//! Resolution is pure: no I/O, no side effects. Any path containing `..` is
//! rejected here, which guarantees that no store call is ever made for a
//! traversal attempt. So is any segment named like the directory marker,
//! since a caller-written object at a marker key would be indistinguishable
//! from a directory.

use std::fmt;

use crate::config::{DEFAULT_MARKER_NAME, StorageConfig};
use crate::error::{Error, Result};
use crate::limits::PathLimits;

/// Key separator used by every object store this crate targets.
pub const SEPARATOR: char = '/';

/// Store-internal key. Only [`PathResolver`] produces these from caller input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey(String);

impl StoreKey {
    /// Wrap a key that came back from the store itself.
    pub(crate) fn from_store(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key as sent to the store client.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key is in directory form (trailing separator).
    pub fn is_dir_form(&self) -> bool {
        self.0.ends_with(SEPARATOR)
    }

    /// Directory form of this key.
    pub fn to_dir(&self) -> StoreKey {
        if self.is_dir_form() {
            self.clone()
        } else {
            Self(format!("{}{}", self.0, SEPARATOR))
        }
    }

    /// Directory-form key of the enclosing directory, `None` for the root.
    pub fn parent(&self) -> Option<StoreKey> {
        let trimmed = self.0.trim_end_matches(SEPARATOR);
        if trimmed.is_empty() {
            return None;
        }
        let idx = trimmed.rfind(SEPARATOR)?;
        Some(Self(trimmed[..=idx].to_string()))
    }

    /// Append a relative path to a directory-form key.
    pub(crate) fn join(&self, relative: &str) -> StoreKey {
        Self(format!("{}{}", self.to_dir().0, relative))
    }

    /// Path relative to `dir`, if this key lives under it.
    pub fn relative_to(&self, dir: &StoreKey) -> Option<&str> {
        let dir = dir.as_str();
        if dir.ends_with(SEPARATOR) {
            self.0.strip_prefix(dir)
        } else {
            self.0
                .strip_prefix(dir)
                .and_then(|rest| rest.strip_prefix(SEPARATOR))
        }
    }

    /// Last path segment, without any trailing separator.
    pub fn name(&self) -> &str {
        let trimmed = self.0.trim_end_matches(SEPARATOR);
        match trimmed.rfind(SEPARATOR) {
            Some(idx) => &trimmed[idx + 1..],
            None => trimmed,
        }
    }

    /// Directory-form keys of every ancestor, root first, ending with this
    /// key itself when it is in directory form.
    ///
    /// `/a/b/c.txt` yields `/`, `/a/`, `/a/b/`.
    pub fn ancestors_from_root(&self) -> Vec<StoreKey> {
        let dir = if self.is_dir_form() {
            self.clone()
        } else {
            match self.parent() {
                Some(parent) => parent,
                None => return Vec::new(),
            }
        };

        let mut result = vec![Self(SEPARATOR.to_string())];
        let mut current = String::from(SEPARATOR);
        for segment in dir.0.split(SEPARATOR).filter(|s| !s.is_empty()) {
            current.push_str(segment);
            current.push(SEPARATOR);
            result.push(Self(current.clone()));
        }
        result
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A path as seen by callers: `<scheme>://<absolute path>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExternalUri {
    scheme: String,
    path: String,
}

impl ExternalUri {
    /// URI scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Absolute path component, without tenant.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ExternalUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.path)
    }
}

/// Converts `(tenant, uri)` pairs to store keys and back.
#[derive(Debug, Clone)]
pub struct PathResolver {
    scheme: String,
    marker_name: String,
    limits: PathLimits,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::from_config(&StorageConfig::default())
    }
}

impl PathResolver {
    /// Create a resolver for the given scheme and limits, reserving the
    /// default marker name.
    pub fn new(scheme: impl Into<String>, limits: PathLimits) -> Self {
        Self {
            scheme: scheme.into(),
            marker_name: DEFAULT_MARKER_NAME.to_string(),
            limits,
        }
    }

    /// Reserve a different directory marker name.
    pub fn marker_name(mut self, name: impl Into<String>) -> Self {
        self.marker_name = name.into();
        self
    }

    /// Create a resolver from a storage configuration.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.scheme.clone(), config.limits.clone())
            .marker_name(config.marker_name.clone())
    }

    /// The external URI scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Extract and validate the absolute path of an external URI.
    ///
    /// Accepts `<scheme>://path`, `/path`, and `path`. The returned path
    /// always starts with a separator and is otherwise as the caller wrote it.
    pub fn external_path(&self, uri: &str) -> Result<String> {
        let raw = match uri.split_once("://") {
            Some((scheme, rest)) if scheme == self.scheme => rest,
            Some(_) => return Err(Error::invalid_path(uri, "unsupported uri scheme")),
            None => uri,
        };

        if raw.contains("..") {
            return Err(Error::invalid_path(uri, "parent traversal"));
        }
        if raw.split(SEPARATOR).any(|segment| segment == self.marker_name) {
            return Err(Error::invalid_path(uri, "reserved directory marker name"));
        }

        self.limits
            .validate_path(raw)
            .map_err(|e| Error::invalid_path(uri, e.to_string()))?;

        if raw.starts_with(SEPARATOR) {
            Ok(raw.to_string())
        } else {
            Ok(format!("{SEPARATOR}{raw}"))
        }
    }

    /// Canonical external form of a caller-supplied URI.
    pub fn canonical(&self, uri: &str) -> Result<ExternalUri> {
        let path = self.external_path(uri)?;
        Ok(self.uri_for_path(path))
    }

    /// Resolve a caller URI into a store key under the tenant's namespace.
    ///
    /// Repeated separators are collapsed so every key segment is non-empty.
    pub fn resolve(&self, tenant: Option<&str>, uri: &str) -> Result<StoreKey> {
        let path = self.external_path(uri)?;
        let mut key = String::with_capacity(path.len() + 16);

        if let Some(tenant) = tenant {
            self.validate_tenant(tenant)?;
            key.push(SEPARATOR);
            key.push_str(tenant);
        }

        let trailing = path.ends_with(SEPARATOR);
        for segment in path.split(SEPARATOR).filter(|s| !s.is_empty()) {
            key.push(SEPARATOR);
            key.push_str(segment);
        }
        if trailing || key.is_empty() {
            key.push(SEPARATOR);
        }

        Ok(StoreKey(key))
    }

    /// Turn a store key back into an external URI, dropping the tenant.
    pub fn unresolve(&self, tenant: Option<&str>, key: &StoreKey) -> ExternalUri {
        let raw = key.as_str();
        let path = match tenant {
            Some(tenant) => {
                let tenant_root = format!("{SEPARATOR}{tenant}");
                match raw.strip_prefix(&tenant_root) {
                    Some("") => SEPARATOR.to_string(),
                    Some(rest) if rest.starts_with(SEPARATOR) => rest.to_string(),
                    _ => raw.to_string(),
                }
            }
            None => raw.to_string(),
        };
        self.uri_for_path(path)
    }

    fn uri_for_path(&self, path: String) -> ExternalUri {
        ExternalUri {
            scheme: self.scheme.clone(),
            path,
        }
    }

    fn validate_tenant(&self, tenant: &str) -> Result<()> {
        if tenant.is_empty()
            || tenant == "."
            || tenant.contains("..")
            || tenant.contains(SEPARATOR)
            || tenant == self.marker_name
        {
            return Err(Error::invalid_path(tenant, "invalid tenant identifier"));
        }
        self.limits
            .validate_path(tenant)
            .map_err(|e| Error::invalid_path(tenant, e.to_string()))
    }
}
