//! Tenant-scoped file-system facade over an object store.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::attributes::{FileAttributes, attributes_of};
use crate::config::StorageConfig;
use crate::error::{Error, Result, StoreResultExt};
use crate::listing::Enumerator;
use crate::logging::LogConfig;
use crate::marker::DirectoryMarkers;
use crate::mutation::Mutator;
use crate::path::{ExternalUri, PathResolver, StoreKey};
use crate::store::{InMemoryStore, ObjectMetadata, ObjectStoreClient};

/// Object content together with its user metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageObject {
    /// User metadata stored with the object.
    pub metadata: ObjectMetadata,
    /// Object content.
    pub content: Vec<u8>,
}

/// Hierarchical, tenant-isolated storage over a flat object store.
///
/// Every operation takes an optional tenant and an external URI. Paths are
/// validated before any store call; errors carry the external URI, never the
/// tenant-prefixed key.
///
/// # Example
///
/// ```rust
/// use blobfs::{ObjectMetadata, Storage};
///
/// tokio_test::block_on(async {
///     let storage = Storage::new();
///     storage.create_directory(Some("t1"), "/a/b/").await.unwrap();
///     storage
///         .put(Some("t1"), "/a/b/c.txt", b"x", &ObjectMetadata::new())
///         .await
///         .unwrap();
///
///     let deleted = storage.delete_by_prefix(Some("t1"), "/a/").await.unwrap();
///     assert_eq!(deleted.len(), 3);
///     assert!(!storage.exists(Some("t1"), "/a").await.unwrap());
/// });
/// ```
pub struct Storage {
    client: Arc<dyn ObjectStoreClient>,
    resolver: PathResolver,
    markers: DirectoryMarkers,
    log_config: LogConfig,
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage {
    /// Create a storage over a fresh in-memory store with default settings.
    pub fn new() -> Self {
        Self::with_client(Arc::new(InMemoryStore::new()))
    }

    /// Create a storage over the given client with default settings.
    pub fn with_client(client: Arc<dyn ObjectStoreClient>) -> Self {
        let config = StorageConfig::default();
        Self {
            client,
            resolver: PathResolver::from_config(&config),
            markers: DirectoryMarkers::new(config.marker_name),
            log_config: LogConfig::default(),
        }
    }

    /// Create a new StorageBuilder for customized configuration.
    pub fn builder() -> StorageBuilder {
        StorageBuilder::default()
    }

    /// The underlying object store client.
    pub fn client(&self) -> &Arc<dyn ObjectStoreClient> {
        &self.client
    }

    /// The path resolver used by this storage.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// The directory marker protocol used by this storage.
    pub fn markers(&self) -> &DirectoryMarkers {
        &self.markers
    }

    fn enumerator(&self) -> Enumerator<'_> {
        Enumerator::new(self.client.as_ref(), &self.markers)
    }

    fn mutator(&self) -> Mutator<'_> {
        Mutator::new(self.client.as_ref(), &self.markers)
    }

    /// Resolve a caller URI to its store key and canonical external form.
    fn locate(&self, tenant: Option<&str>, uri: &str) -> Result<(StoreKey, ExternalUri)> {
        let key = self.resolver.resolve(tenant, uri)?;
        let external = self.resolver.canonical(uri)?;
        Ok((key, external))
    }

    /// Read the full content of a file.
    pub async fn get(&self, tenant: Option<&str>, uri: &str) -> Result<Vec<u8>> {
        let (key, external) = self.locate(tenant, uri)?;
        self.client
            .open_read(key.as_str())
            .await
            .for_uri(&external.to_string())
    }

    /// Read a file's content and user metadata.
    pub async fn get_with_metadata(
        &self,
        tenant: Option<&str>,
        uri: &str,
    ) -> Result<StorageObject> {
        let (key, external) = self.locate(tenant, uri)?;
        let external = external.to_string();
        let props = self
            .client
            .get_metadata(key.as_str())
            .await
            .for_uri(&external)?;
        let content = self.client.open_read(key.as_str()).await.for_uri(&external)?;
        Ok(StorageObject {
            metadata: props.metadata,
            content,
        })
    }

    /// Upload a file, creating every missing ancestor directory first.
    ///
    /// Overwrites an existing file. Returns the canonical URI of the file.
    pub async fn put(
        &self,
        tenant: Option<&str>,
        uri: &str,
        content: &[u8],
        metadata: &ObjectMetadata,
    ) -> Result<ExternalUri> {
        let (key, external) = self.locate(tenant, uri)?;
        if key.is_dir_form() {
            return Err(Error::invalid_path(uri, "cannot write a file at a directory path"));
        }

        tracing::debug!(
            uri = %external,
            metadata = %self.log_config.format_metadata(metadata),
            "put"
        );
        self.mutator()
            .write(&key, content, metadata)
            .await
            .for_uri(&external.to_string())?;
        Ok(external)
    }

    /// Whether a file or directory exists at `uri`.
    ///
    /// A URI with a trailing separator only matches a directory. Backend
    /// failures report `false`; only an invalid path is an error.
    pub async fn exists(&self, tenant: Option<&str>, uri: &str) -> Result<bool> {
        let (key, external) = self.locate(tenant, uri)?;

        let found = if key.is_dir_form() {
            self.markers.is_directory(self.client.as_ref(), &key).await
        } else {
            match self.client.exists(key.as_str()).await {
                Ok(true) => Ok(true),
                Ok(false) => self.markers.is_directory(self.client.as_ref(), &key).await,
                Err(e) => Err(e),
            }
        };

        match found {
            Ok(found) => Ok(found),
            Err(e) => {
                tracing::debug!(uri = %external, error = %e, "existence check failed");
                Ok(false)
            }
        }
    }

    /// Size of a file in bytes; 0 for a directory.
    pub async fn size(&self, tenant: Option<&str>, uri: &str) -> Result<u64> {
        Ok(self.get_attributes(tenant, uri).await?.size)
    }

    /// Last modification time of a file or directory.
    pub async fn last_modified_time(
        &self,
        tenant: Option<&str>,
        uri: &str,
    ) -> Result<DateTime<Utc>> {
        Ok(self.get_attributes(tenant, uri).await?.last_modified)
    }

    /// Attributes of a file or directory.
    pub async fn get_attributes(&self, tenant: Option<&str>, uri: &str) -> Result<FileAttributes> {
        let (key, external) = self.locate(tenant, uri)?;
        attributes_of(self.client.as_ref(), &self.markers, &key)
            .await
            .for_uri(&external.to_string())
    }

    /// Attributes of every direct child of the directory at `uri`.
    ///
    /// Fails with [`Error::NotFound`] if `uri` is not a directory. Entries
    /// deleted while the listing is in progress are skipped.
    pub async fn list(&self, tenant: Option<&str>, uri: &str) -> Result<Vec<FileAttributes>> {
        let (key, external) = self.locate(tenant, uri)?;
        let listing = self
            .enumerator()
            .list(&key, false, true)
            .await
            .for_uri(&external.to_string())?;

        let mut out = Vec::with_capacity(listing.len());
        for entry in listing {
            match attributes_of(self.client.as_ref(), &self.markers, &entry.key).await {
                Ok(attrs) => out.push(attrs),
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    let entry_uri = self.resolver.unresolve(tenant, &entry.key).to_string();
                    return Err(Error::from_store(entry_uri, e));
                }
            }
        }
        Ok(out)
    }

    /// Canonical URIs of every file under `prefix`, recursively.
    ///
    /// Directories are included (with a trailing separator) when
    /// `include_directories` is set. An absent prefix yields an empty list.
    pub async fn all_by_prefix(
        &self,
        tenant: Option<&str>,
        prefix: &str,
        include_directories: bool,
    ) -> Result<Vec<ExternalUri>> {
        let (key, external) = self.locate(tenant, prefix)?;
        let listing = match self.enumerator().list(&key, true, include_directories).await {
            Ok(listing) => listing,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(Error::from_store(external.to_string(), e)),
        };
        Ok(listing
            .map(|entry| self.resolver.unresolve(tenant, &entry.key))
            .collect())
    }

    /// Create a directory and any missing ancestors.
    ///
    /// Succeeds if the directory already exists. Returns its canonical URI.
    pub async fn create_directory(&self, tenant: Option<&str>, uri: &str) -> Result<ExternalUri> {
        let (key, external) = self.locate(tenant, uri)?;
        self.mutator()
            .create_directory(&key)
            .await
            .for_uri(&external.to_string())?;
        Ok(external)
    }

    /// Move a file or directory tree from `from` to `to`.
    ///
    /// A file moved onto a directory, or onto a URI with a trailing
    /// separator, lands inside it under its own name. Not atomic: a failure
    /// part way leaves a partial copy at `to` and the source intact. Returns
    /// the canonical URI of `from`.
    pub async fn rename(&self, tenant: Option<&str>, from: &str, to: &str) -> Result<ExternalUri> {
        let (from_key, from_external) = self.locate(tenant, from)?;
        let (to_key, _) = self.locate(tenant, to)?;

        if from_key.to_dir() == to_key.to_dir() {
            return Err(Error::invalid_path(to, "source and destination are the same"));
        }
        if to_key.as_str().starts_with(from_key.to_dir().as_str()) {
            return Err(Error::invalid_path(to, "cannot move a path into itself"));
        }

        self.mutator()
            .move_tree(&from_key, &to_key)
            .await
            .for_uri(&from_external.to_string())?;
        tracing::debug!(from = %from_external, "renamed");
        Ok(from_external)
    }

    /// Delete a file, or a directory and everything below it.
    ///
    /// Returns `false` if nothing existed at `uri`.
    pub async fn delete(&self, tenant: Option<&str>, uri: &str) -> Result<bool> {
        let (key, external) = self.locate(tenant, uri)?;
        self.mutator()
            .delete(&key)
            .await
            .for_uri(&external.to_string())
    }

    /// Delete everything under `prefix`, including the prefix directory.
    ///
    /// Returns the canonical URIs of deleted files and directories.
    pub async fn delete_by_prefix(
        &self,
        tenant: Option<&str>,
        prefix: &str,
    ) -> Result<Vec<ExternalUri>> {
        let (key, external) = self.locate(tenant, prefix)?;
        let deleted = self
            .mutator()
            .delete_by_prefix(&key)
            .await
            .for_uri(&external.to_string())?;
        Ok(deleted
            .iter()
            .map(|key| self.resolver.unresolve(tenant, key))
            .collect())
    }
}

/// Builder for customized Storage configuration.
#[derive(Default)]
pub struct StorageBuilder {
    client: Option<Arc<dyn ObjectStoreClient>>,
    config: StorageConfig,
    log_config: LogConfig,
}

impl StorageBuilder {
    /// Set the object store client. Defaults to an [`InMemoryStore`].
    pub fn client(mut self, client: Arc<dyn ObjectStoreClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the storage configuration.
    pub fn config(mut self, config: StorageConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the logging configuration.
    pub fn log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// Build the Storage instance.
    ///
    /// Fails if the configuration is invalid.
    pub fn build(self) -> Result<Storage> {
        self.config.validate()?;
        let client = self
            .client
            .unwrap_or_else(|| Arc::new(InMemoryStore::new()));
        Ok(Storage {
            client,
            resolver: PathResolver::from_config(&self.config),
            markers: DirectoryMarkers::new(self.config.marker_name),
            log_config: self.log_config,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const T: Option<&str> = Some("main");

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let storage = Storage::new();
        let uri = storage
            .put(T, "/ns/file.txt", b"hello", &ObjectMetadata::new())
            .await
            .unwrap();
        assert_eq!(uri.to_string(), "blobfs:///ns/file.txt");
        assert_eq!(storage.get(T, "/ns/file.txt").await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_put_at_directory_path_is_rejected() {
        let storage = Storage::new();
        let err = storage
            .put(T, "/ns/dir/", b"x", &ObjectMetadata::new())
            .await
            .unwrap_err();
        assert!(err.is_invalid_path());
    }

    #[tokio::test]
    async fn test_errors_carry_external_uri() {
        let storage = Storage::new();
        let err = storage.get(T, "/ns/missing.txt").await.unwrap_err();
        assert!(err.is_not_found());
        let message = err.to_string();
        assert!(message.contains("blobfs:///ns/missing.txt"), "{message}");
        assert!(!message.contains("/main/"), "{message}");
    }

    #[tokio::test]
    async fn test_rename_onto_self_is_rejected() {
        let storage = Storage::new();
        storage.create_directory(T, "/a/").await.unwrap();
        assert!(storage.rename(T, "/a", "/a/").await.unwrap_err().is_invalid_path());
        assert!(storage.rename(T, "/a", "/a/b").await.unwrap_err().is_invalid_path());
        assert!(storage.exists(T, "/a/").await.unwrap());
    }

    #[test]
    fn test_builder_validates_config() {
        let result = Storage::builder()
            .config(StorageConfig::new().marker_name("a/b"))
            .build();
        assert!(result.is_err());

        let storage = Storage::builder()
            .config(StorageConfig::new().scheme("assets"))
            .build()
            .unwrap();
        assert_eq!(storage.resolver().scheme(), "assets");
    }
}
