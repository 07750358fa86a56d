//! Reconstructing a tree view from flat prefix listings.
//!
//! The store returns raw keys. Markers are removed from the name stream but
//! tag their directory as a directory entry; the prefix's own identity is
//! dropped; a same-named file under a marked directory is hidden behind the
//! directory.

use std::collections::HashSet;

use crate::error::{StoreError, StoreResult};
use crate::marker::DirectoryMarkers;
use crate::path::{SEPARATOR, StoreKey};
use crate::store::ObjectStoreClient;

/// One entry of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedKey {
    /// Full store key; directories are in directory form.
    pub key: StoreKey,
    /// Whether the entry is a directory.
    pub is_directory: bool,
}

/// Finite, single-pass sequence of listed keys.
///
/// Order is unspecified. Listing again re-queries the store.
#[derive(Debug)]
pub struct Listing {
    entries: std::vec::IntoIter<ListedKey>,
}

impl Listing {
    fn new(entries: Vec<ListedKey>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }
}

impl Iterator for Listing {
    type Item = ListedKey;

    fn next(&mut self) -> Option<ListedKey> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for Listing {}

/// Lists keys under a prefix and classifies them.
pub struct Enumerator<'a> {
    client: &'a dyn ObjectStoreClient,
    markers: &'a DirectoryMarkers,
}

impl<'a> Enumerator<'a> {
    /// Create an enumerator over a client.
    pub fn new(client: &'a dyn ObjectStoreClient, markers: &'a DirectoryMarkers) -> Self {
        Self { client, markers }
    }

    /// List entries under `prefix`.
    ///
    /// With `recursive` the whole subtree is returned, otherwise only direct
    /// children. Fails with a not-found error unless `prefix` is a directory.
    pub async fn list(
        &self,
        prefix: &StoreKey,
        recursive: bool,
        include_directories: bool,
    ) -> StoreResult<Listing> {
        if !self.markers.is_directory(self.client, prefix).await? {
            return Err(StoreError::BlobNotFound(prefix.to_string()));
        }

        let dir = prefix.to_dir();
        let delimiter = (!recursive).then_some(SEPARATOR);
        let items = self.client.list_by_prefix(dir.as_str(), delimiter).await?;
        let raw_count = items.len();

        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let entry = if item.is_prefix {
                let sub = StoreKey::from_store(item.key);
                if sub == dir {
                    continue;
                }
                // A bare prefix with no marker is not a directory.
                if !self.markers.is_directory(self.client, &sub).await? {
                    tracing::trace!("skipping unmarked prefix");
                    continue;
                }
                ListedKey {
                    key: sub,
                    is_directory: true,
                }
            } else if self.markers.is_marker(&item.key) {
                match self.markers.directory_of(&item.key) {
                    Some(sub) if sub != dir => ListedKey {
                        key: sub,
                        is_directory: true,
                    },
                    _ => continue,
                }
            } else {
                let key = StoreKey::from_store(item.key);
                if key.relative_to(&dir).is_none_or(str::is_empty) {
                    continue;
                }
                ListedKey {
                    key,
                    is_directory: false,
                }
            };
            entries.push(entry);
        }

        let directories: HashSet<StoreKey> = entries
            .iter()
            .filter(|e| e.is_directory)
            .map(|e| e.key.clone())
            .collect();
        let mut seen = HashSet::new();
        entries.retain(|e| {
            if e.is_directory {
                include_directories && seen.insert(e.key.clone())
            } else {
                !directories.contains(&e.key.to_dir()) && seen.insert(e.key.clone())
            }
        });

        tracing::trace!(
            raw = raw_count,
            entries = entries.len(),
            recursive,
            "enumerated prefix"
        );
        Ok(Listing::new(entries))
    }

    /// Every raw key under directory `dir`, markers included.
    pub async fn subtree(&self, dir: &StoreKey) -> StoreResult<Vec<StoreKey>> {
        let items = self.client.list_by_prefix(dir.to_dir().as_str(), None).await?;
        Ok(items
            .into_iter()
            .filter(|item| !item.is_prefix)
            .map(|item| StoreKey::from_store(item.key))
            .collect())
    }
}
