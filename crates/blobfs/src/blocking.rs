//! Synchronous wrapper around [`Storage`].
//!
//! Each call blocks the current thread until the async operation completes
//! on a private current-thread runtime. Do not call from inside an async
//! runtime; use [`Storage`] directly there.

use chrono::{DateTime, Utc};
use tokio::runtime::Runtime;

use crate::attributes::FileAttributes;
use crate::error::{Error, Result, StoreError};
use crate::path::ExternalUri;
use crate::storage::{Storage, StorageObject};
use crate::store::ObjectMetadata;

/// Blocking facade over [`Storage`].
pub struct BlockingStorage {
    inner: Storage,
    runtime: Runtime,
}

impl BlockingStorage {
    /// Wrap a storage with its own runtime.
    pub fn new(inner: Storage) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::StorageIo {
                uri: String::new(),
                source: StoreError::Io(e),
            })?;
        Ok(Self { inner, runtime })
    }

    /// The wrapped async storage.
    pub fn inner(&self) -> &Storage {
        &self.inner
    }

    /// See [`Storage::get`].
    pub fn get(&self, tenant: Option<&str>, uri: &str) -> Result<Vec<u8>> {
        self.runtime.block_on(self.inner.get(tenant, uri))
    }

    /// See [`Storage::get_with_metadata`].
    pub fn get_with_metadata(&self, tenant: Option<&str>, uri: &str) -> Result<StorageObject> {
        self.runtime.block_on(self.inner.get_with_metadata(tenant, uri))
    }

    /// See [`Storage::put`].
    pub fn put(
        &self,
        tenant: Option<&str>,
        uri: &str,
        content: &[u8],
        metadata: &ObjectMetadata,
    ) -> Result<ExternalUri> {
        self.runtime.block_on(self.inner.put(tenant, uri, content, metadata))
    }

    /// See [`Storage::exists`].
    pub fn exists(&self, tenant: Option<&str>, uri: &str) -> Result<bool> {
        self.runtime.block_on(self.inner.exists(tenant, uri))
    }

    /// See [`Storage::size`].
    pub fn size(&self, tenant: Option<&str>, uri: &str) -> Result<u64> {
        self.runtime.block_on(self.inner.size(tenant, uri))
    }

    /// See [`Storage::last_modified_time`].
    pub fn last_modified_time(&self, tenant: Option<&str>, uri: &str) -> Result<DateTime<Utc>> {
        self.runtime.block_on(self.inner.last_modified_time(tenant, uri))
    }

    /// See [`Storage::get_attributes`].
    pub fn get_attributes(&self, tenant: Option<&str>, uri: &str) -> Result<FileAttributes> {
        self.runtime.block_on(self.inner.get_attributes(tenant, uri))
    }

    /// See [`Storage::list`].
    pub fn list(&self, tenant: Option<&str>, uri: &str) -> Result<Vec<FileAttributes>> {
        self.runtime.block_on(self.inner.list(tenant, uri))
    }

    /// See [`Storage::all_by_prefix`].
    pub fn all_by_prefix(
        &self,
        tenant: Option<&str>,
        prefix: &str,
        include_directories: bool,
    ) -> Result<Vec<ExternalUri>> {
        self.runtime.block_on(self.inner.all_by_prefix(tenant, prefix, include_directories))
    }

    /// See [`Storage::create_directory`].
    pub fn create_directory(&self, tenant: Option<&str>, uri: &str) -> Result<ExternalUri> {
        self.runtime.block_on(self.inner.create_directory(tenant, uri))
    }

    /// See [`Storage::rename`].
    pub fn rename(&self, tenant: Option<&str>, from: &str, to: &str) -> Result<ExternalUri> {
        self.runtime.block_on(self.inner.rename(tenant, from, to))
    }

    /// See [`Storage::delete`].
    pub fn delete(&self, tenant: Option<&str>, uri: &str) -> Result<bool> {
        self.runtime.block_on(self.inner.delete(tenant, uri))
    }

    /// See [`Storage::delete_by_prefix`].
    pub fn delete_by_prefix(&self, tenant: Option<&str>, prefix: &str) -> Result<Vec<ExternalUri>> {
        self.runtime.block_on(self.inner.delete_by_prefix(tenant, prefix))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_round_trip() {
        let storage = BlockingStorage::new(Storage::new()).unwrap();
        storage
            .put(Some("t"), "/a/b.txt", b"abc", &ObjectMetadata::new())
            .unwrap();
        assert_eq!(storage.get(Some("t"), "/a/b.txt").unwrap(), b"abc");
        assert_eq!(storage.size(Some("t"), "/a/b.txt").unwrap(), 3);
        assert!(storage.exists(Some("t"), "/a/").unwrap());
        assert!(storage.delete(Some("t"), "/a").unwrap());
        assert!(!storage.exists(Some("t"), "/a/b.txt").unwrap());
    }
}
