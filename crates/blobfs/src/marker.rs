//! Directory markers.
//!
//! A directory exists iff a zero-length object named after the marker lives
//! directly under its key: `/main/ns/folder/.blobfsdir`. Nothing else
//! (trailing separators, files below a prefix) makes a directory.
//!
//! When a marker and a same-named file coexist, the marker wins: the key is
//! classified as a directory everywhere.

use crate::error::StoreResult;
use crate::path::{SEPARATOR, StoreKey};
use crate::store::{ObjectMetadata, ObjectStoreClient};

/// Marker naming and directory predicates.
#[derive(Debug, Clone)]
pub struct DirectoryMarkers {
    name: String,
    suffix: String,
}

impl DirectoryMarkers {
    /// Create the protocol for a given marker object name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let suffix = format!("{SEPARATOR}{name}");
        Self { name, suffix }
    }

    /// Marker object name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key of the marker object for a directory.
    ///
    /// Marker keys are returned unchanged.
    pub fn marker_key_for(&self, dir: &StoreKey) -> StoreKey {
        if self.is_marker(dir.as_str()) {
            return dir.clone();
        }
        dir.join(&self.name)
    }

    /// Whether a raw store key names a marker object.
    pub fn is_marker(&self, key: &str) -> bool {
        key.ends_with(&self.suffix)
    }

    /// Directory-form key a marker object belongs to.
    pub fn directory_of(&self, marker_key: &str) -> Option<StoreKey> {
        marker_key
            .strip_suffix(&self.name)
            .filter(|dir| dir.ends_with(SEPARATOR))
            .map(StoreKey::from_store)
    }

    /// Whether `key` is a directory, i.e. its marker exists.
    pub async fn is_directory(
        &self,
        client: &dyn ObjectStoreClient,
        key: &StoreKey,
    ) -> StoreResult<bool> {
        client.exists(self.marker_key_for(key).as_str()).await
    }

    /// Create the marker for `dir` if it is absent.
    ///
    /// Idempotent, including under concurrent callers: every marker write
    /// carries the same empty payload. Returns whether a marker was written.
    pub async fn ensure_directory(
        &self,
        client: &dyn ObjectStoreClient,
        dir: &StoreKey,
    ) -> StoreResult<bool> {
        if self.is_directory(client, dir).await? {
            return Ok(false);
        }
        let marker = self.marker_key_for(dir);
        client.write(marker.as_str(), &[], &ObjectMetadata::new()).await?;
        Ok(true)
    }

    /// Create markers for `dir` and every ancestor of it, root first.
    ///
    /// If `dir` itself is already marked, nothing else is checked. Otherwise
    /// one existence check per level, plus one write per missing level.
    /// Markers already written stay in place if a later level fails.
    pub async fn materialize(
        &self,
        client: &dyn ObjectStoreClient,
        dir: &StoreKey,
    ) -> StoreResult<usize> {
        let dir = dir.to_dir();
        if self.is_directory(client, &dir).await? {
            return Ok(0);
        }

        let mut created = 0;
        for ancestor in dir.ancestors_from_root() {
            if self.ensure_directory(client, &ancestor).await? {
                created += 1;
            }
        }
        Ok(created)
    }
}
