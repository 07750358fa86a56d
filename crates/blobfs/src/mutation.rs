//! Composite mutations built from single-object store calls.
//!
//! None of these are atomic. Each is an ordered sequence of idempotent
//! steps; after a failure the store holds whatever the completed steps
//! produced, and re-running the operation converges:
//!
//! - `write`: ancestor markers, then the object. Markers are not rolled back
//!   if the upload fails.
//! - `delete_by_prefix`: files first, then markers deepest-first.
//! - `move_tree`: copy everything, then delete the source. A failed copy
//!   leaves a partial destination and an intact source.

use std::collections::HashSet;

use crate::error::{StoreError, StoreResult};
use crate::listing::Enumerator;
use crate::marker::DirectoryMarkers;
use crate::path::StoreKey;
use crate::store::{ObjectMetadata, ObjectStoreClient};

pub(crate) struct Mutator<'a> {
    client: &'a dyn ObjectStoreClient,
    markers: &'a DirectoryMarkers,
}

impl<'a> Mutator<'a> {
    pub(crate) fn new(client: &'a dyn ObjectStoreClient, markers: &'a DirectoryMarkers) -> Self {
        Self { client, markers }
    }

    /// Upload an object, materializing its ancestor directories first.
    pub(crate) async fn write(
        &self,
        key: &StoreKey,
        content: &[u8],
        metadata: &ObjectMetadata,
    ) -> StoreResult<()> {
        let created = match key.parent() {
            Some(parent) => self.markers.materialize(self.client, &parent).await?,
            None => 0,
        };
        self.client.write(key.as_str(), content, metadata).await?;
        tracing::debug!(
            bytes = content.len(),
            markers_created = created,
            "wrote object"
        );
        Ok(())
    }

    /// Create a directory and all of its ancestors.
    pub(crate) async fn create_directory(&self, key: &StoreKey) -> StoreResult<()> {
        let created = self.markers.materialize(self.client, &key.to_dir()).await?;
        tracing::debug!(markers_created = created, "created directory");
        Ok(())
    }

    /// Delete a file, or a directory with everything under it.
    ///
    /// Returns `false` when nothing was there to delete.
    pub(crate) async fn delete(&self, key: &StoreKey) -> StoreResult<bool> {
        if self.markers.is_directory(self.client, key).await? {
            return Ok(!self.delete_by_prefix(key).await?.is_empty());
        }
        if key.is_dir_form() {
            return Ok(false);
        }
        self.delete_if_present(key).await
    }

    /// Delete every object under `prefix` plus the prefix's own directory.
    ///
    /// Files go first, then directory markers in descending key length so a
    /// child directory disappears before its parent. Returns the deleted
    /// files and directories (directories in directory form). An absent
    /// prefix yields an empty result.
    pub(crate) async fn delete_by_prefix(&self, prefix: &StoreKey) -> StoreResult<Vec<StoreKey>> {
        let dir = prefix.to_dir();
        let keys = match Enumerator::new(self.client, self.markers).subtree(&dir).await {
            Ok(keys) => keys,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut deleted = Vec::new();
        let mut directories = Vec::new();
        for key in keys {
            if self.markers.is_marker(key.as_str()) {
                directories.extend(self.markers.directory_of(key.as_str()));
                continue;
            }
            if self.delete_if_present(&key).await? {
                deleted.push(key);
            }
        }
        let files_deleted = deleted.len();

        if !directories.contains(&dir) {
            directories.push(dir);
        }
        directories.sort_by(|a, b| b.as_str().len().cmp(&a.as_str().len()));

        for directory in directories {
            let marker = self.markers.marker_key_for(&directory);
            if self.delete_if_present(&marker).await? {
                deleted.push(directory);
            }
        }

        tracing::debug!(
            files = files_deleted,
            directories = deleted.len() - files_deleted,
            "deleted prefix"
        );
        Ok(deleted)
    }

    /// Move a file or a directory tree from `from` to `to`.
    ///
    /// A file moved to a directory-form key, or onto an existing directory,
    /// lands inside that directory under its own name. Copies run one at a
    /// time, each awaited to completion. The source is only deleted once
    /// every copy has succeeded. Returns the key the source now lives at.
    pub(crate) async fn move_tree(
        &self,
        from: &StoreKey,
        to: &StoreKey,
    ) -> StoreResult<StoreKey> {
        if !self.markers.is_directory(self.client, from).await? {
            if from.is_dir_form() || !self.client.exists(from.as_str()).await? {
                return Err(StoreError::BlobNotFound(from.to_string()));
            }
            return self.move_file(from, to).await;
        }

        let src_dir = from.to_dir();
        let dst_dir = to.to_dir();
        self.markers.materialize(self.client, &dst_dir).await?;

        let keys = Enumerator::new(self.client, self.markers)
            .subtree(&src_dir)
            .await?;
        let marked: HashSet<StoreKey> = keys
            .iter()
            .filter_map(|key| self.markers.directory_of(key.as_str()))
            .collect();

        let mut copied = 0usize;
        for key in &keys {
            let Some(relative) = key.relative_to(&src_dir) else {
                continue;
            };

            if self.markers.is_marker(key.as_str()) {
                // Recreate the directory itself so empty ones survive.
                if let Some(directory) = self.markers.directory_of(key.as_str()) {
                    if let Some(rel_dir) = directory.relative_to(&src_dir) {
                        self.markers.materialize(self.client, &dst_dir.join(rel_dir)).await?;
                    }
                }
                continue;
            }
            if marked.contains(&key.to_dir()) {
                // Hidden behind a directory of the same name.
                continue;
            }

            let dest = dst_dir.join(relative);
            if let Some(parent) = dest.parent() {
                self.markers.materialize(self.client, &parent).await?;
            }
            self.client.copy(key.as_str(), dest.as_str()).await?;
            copied += 1;
        }

        self.delete_by_prefix(&src_dir).await?;
        tracing::debug!(copied, "moved directory");
        Ok(dst_dir)
    }

    async fn move_file(&self, from: &StoreKey, to: &StoreKey) -> StoreResult<StoreKey> {
        let dest = if to.is_dir_form() || self.markers.is_directory(self.client, to).await? {
            to.join(from.name())
        } else {
            to.clone()
        };
        if dest == *from {
            return Ok(dest);
        }

        if let Some(parent) = dest.parent() {
            self.markers.materialize(self.client, &parent).await?;
        }
        self.client.copy(from.as_str(), dest.as_str()).await?;
        self.delete_if_present(from).await?;
        tracing::debug!(copied = 1, "moved object");
        Ok(dest)
    }

    async fn delete_if_present(&self, key: &StoreKey) -> StoreResult<bool> {
        match self.client.delete(key.as_str()).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use pretty_assertions::assert_eq;

    fn markers() -> DirectoryMarkers {
        DirectoryMarkers::new(".blobfsdir")
    }

    fn key(s: &str) -> StoreKey {
        StoreKey::from_store(s)
    }

    async fn write_all(store: &InMemoryStore, m: &DirectoryMarkers, keys: &[&str]) {
        let mutator = Mutator::new(store, m);
        for k in keys {
            mutator.write(&key(k), b"data", &ObjectMetadata::new()).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_write_materializes_ancestors() {
        let store = InMemoryStore::new();
        let m = markers();
        write_all(&store, &m, &["/t/a/b/c.txt"]).await;

        assert_eq!(
            store.keys(),
            vec![
                "/.blobfsdir",
                "/t/.blobfsdir",
                "/t/a/.blobfsdir",
                "/t/a/b/.blobfsdir",
                "/t/a/b/c.txt",
            ]
        );
    }

    #[tokio::test]
    async fn test_write_keeps_markers_when_upload_fails() {
        struct FailingUpload(InMemoryStore);

        #[async_trait::async_trait]
        impl ObjectStoreClient for FailingUpload {
            async fn exists(&self, key: &str) -> StoreResult<bool> {
                self.0.exists(key).await
            }
            async fn get_metadata(&self, key: &str) -> StoreResult<crate::store::ObjectProperties> {
                self.0.get_metadata(key).await
            }
            async fn open_read(&self, key: &str) -> StoreResult<Vec<u8>> {
                self.0.open_read(key).await
            }
            async fn write(
                &self,
                key: &str,
                content: &[u8],
                metadata: &ObjectMetadata,
            ) -> StoreResult<()> {
                if content.is_empty() {
                    return self.0.write(key, content, metadata).await;
                }
                Err(StoreError::Service {
                    status: 503,
                    message: "unavailable".into(),
                })
            }
            async fn delete(&self, key: &str) -> StoreResult<()> {
                self.0.delete(key).await
            }
            async fn list_by_prefix(
                &self,
                prefix: &str,
                delimiter: Option<char>,
            ) -> StoreResult<Vec<crate::store::ListItem>> {
                self.0.list_by_prefix(prefix, delimiter).await
            }
            async fn copy(&self, src: &str, dst: &str) -> StoreResult<()> {
                self.0.copy(src, dst).await
            }
        }

        let store = FailingUpload(InMemoryStore::new());
        let m = markers();
        let err = Mutator::new(&store, &m)
            .write(&key("/t/a/file"), b"data", &ObjectMetadata::new())
            .await
            .unwrap_err();
        assert!(!err.is_not_found());
        assert_eq!(
            store.0.keys(),
            vec!["/.blobfsdir", "/t/.blobfsdir", "/t/a/.blobfsdir"]
        );
    }

    #[tokio::test]
    async fn test_delete_file_and_absent() {
        let store = InMemoryStore::new();
        let m = markers();
        write_all(&store, &m, &["/t/a.txt"]).await;
        let mutator = Mutator::new(&store, &m);

        assert!(mutator.delete(&key("/t/a.txt")).await.unwrap());
        assert!(!mutator.delete(&key("/t/a.txt")).await.unwrap());
        assert!(!mutator.delete(&key("/t/nothing/")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_prefix_orders_markers_deepest_first() {
        let store = InMemoryStore::new();
        let m = markers();
        write_all(&store, &m, &["/t/d/a.txt", "/t/d/x/b.txt", "/t/d/x/y/c.txt"]).await;

        let deleted: Vec<String> = Mutator::new(&store, &m)
            .delete_by_prefix(&key("/t/d"))
            .await
            .unwrap()
            .into_iter()
            .map(|k| k.as_str().to_string())
            .collect();

        assert_eq!(
            deleted,
            vec![
                "/t/d/a.txt",
                "/t/d/x/b.txt",
                "/t/d/x/y/c.txt",
                "/t/d/x/y/",
                "/t/d/x/",
                "/t/d/",
            ]
        );
        assert_eq!(store.keys(), vec!["/.blobfsdir", "/t/.blobfsdir"]);
    }

    #[tokio::test]
    async fn test_delete_by_prefix_absent_is_empty() {
        let store = InMemoryStore::new();
        let m = markers();
        let deleted = Mutator::new(&store, &m)
            .delete_by_prefix(&key("/t/none/"))
            .await
            .unwrap();
        assert!(deleted.is_empty());
    }

    #[tokio::test]
    async fn test_move_directory_tree() {
        let store = InMemoryStore::new();
        let m = markers();
        write_all(&store, &m, &["/t/src/a.txt", "/t/src/sub/b.txt"]).await;
        Mutator::new(&store, &m)
            .create_directory(&key("/t/src/empty/"))
            .await
            .unwrap();

        Mutator::new(&store, &m)
            .move_tree(&key("/t/src"), &key("/t/dst"))
            .await
            .unwrap();

        assert_eq!(
            store.keys(),
            vec![
                "/.blobfsdir",
                "/t/.blobfsdir",
                "/t/dst/.blobfsdir",
                "/t/dst/a.txt",
                "/t/dst/empty/.blobfsdir",
                "/t/dst/sub/.blobfsdir",
                "/t/dst/sub/b.txt",
            ]
        );
    }

    #[tokio::test]
    async fn test_move_single_file() {
        let store = InMemoryStore::new();
        let m = markers();
        write_all(&store, &m, &["/t/a.txt"]).await;

        Mutator::new(&store, &m)
            .move_tree(&key("/t/a.txt"), &key("/t/new/b.txt"))
            .await
            .unwrap();

        assert!(!store.exists("/t/a.txt").await.unwrap());
        assert_eq!(store.open_read("/t/new/b.txt").await.unwrap(), b"data");
        assert!(store.exists("/t/new/.blobfsdir").await.unwrap());
    }

    #[tokio::test]
    async fn test_move_file_into_directory() {
        let store = InMemoryStore::new();
        let m = markers();
        write_all(&store, &m, &["/t/a.txt", "/t/b.txt", "/t/dir/x"]).await;
        let mutator = Mutator::new(&store, &m);

        let dest = mutator.move_tree(&key("/t/a.txt"), &key("/t/new/")).await.unwrap();
        assert_eq!(dest.as_str(), "/t/new/a.txt");
        assert!(store.exists("/t/new/.blobfsdir").await.unwrap());

        let dest = mutator.move_tree(&key("/t/b.txt"), &key("/t/dir")).await.unwrap();
        assert_eq!(dest.as_str(), "/t/dir/b.txt");
        assert!(!store.exists("/t/dir").await.unwrap());
        assert!(!store.exists("/t/b.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_move_file_into_its_own_directory_is_a_no_op() {
        let store = InMemoryStore::new();
        let m = markers();
        write_all(&store, &m, &["/t/a.txt"]).await;

        let dest = Mutator::new(&store, &m)
            .move_tree(&key("/t/a.txt"), &key("/t/"))
            .await
            .unwrap();
        assert_eq!(dest.as_str(), "/t/a.txt");
        assert_eq!(store.open_read("/t/a.txt").await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_move_missing_source_is_not_found() {
        let store = InMemoryStore::new();
        let m = markers();
        let err = Mutator::new(&store, &m)
            .move_tree(&key("/t/none"), &key("/t/x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.is_empty());
    }
}
