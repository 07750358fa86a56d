//! In-memory object store.
//!
//! # Fail Points (enabled with `failpoints` feature)
//!
//! - `memory::write` - Inject failures into object uploads
//! - `memory::copy` - Inject failures into server-side copies
//! - `memory::delete` - Inject failures into deletes
//! - `memory::list` - Inject failures into prefix listings

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(feature = "failpoints")]
use fail::fail_point;

use super::traits::{ListItem, ObjectMetadata, ObjectProperties, ObjectStoreClient};
use crate::error::{StoreError, StoreResult};

/// In-memory object store.
///
/// Keys are kept in a sorted map, so listings come back in key order even
/// though the trait does not promise any order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    calls: AtomicUsize,
}

#[derive(Debug, Clone)]
struct StoredObject {
    content: Vec<u8>,
    metadata: ObjectMetadata,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
}

impl StoredObject {
    fn properties(&self) -> ObjectProperties {
        ObjectProperties {
            size: self.content.len() as u64,
            last_modified: self.modified,
            created: self.created,
            metadata: self.metadata.clone(),
        }
    }
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of client calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of every key currently stored, in key order.
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Number of stored objects, markers included.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store holds no objects at all.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(feature = "failpoints")]
fn injected(point: &str) -> StoreError {
    StoreError::Service {
        status: 500,
        message: format!("injected failure at {point}"),
    }
}

#[async_trait]
impl ObjectStoreClient for InMemoryStore {
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.tick();
        Ok(self.read().contains_key(key))
    }

    async fn get_metadata(&self, key: &str) -> StoreResult<ObjectProperties> {
        self.tick();
        self.read()
            .get(key)
            .map(StoredObject::properties)
            .ok_or_else(|| StoreError::BlobNotFound(key.to_string()))
    }

    async fn open_read(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.tick();
        self.read()
            .get(key)
            .map(|object| object.content.clone())
            .ok_or_else(|| StoreError::BlobNotFound(key.to_string()))
    }

    async fn write(&self, key: &str, content: &[u8], metadata: &ObjectMetadata) -> StoreResult<()> {
        self.tick();
        #[cfg(feature = "failpoints")]
        fail_point!("memory::write", |_| Err(injected("memory::write")));

        let now = Utc::now();
        let mut objects = self.write_lock();
        let created = objects.get(key).map(|o| o.created).unwrap_or(now);
        objects.insert(
            key.to_string(),
            StoredObject {
                content: content.to_vec(),
                metadata: metadata.clone(),
                created,
                modified: now,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.tick();
        #[cfg(feature = "failpoints")]
        fail_point!("memory::delete", |_| Err(injected("memory::delete")));

        self.write_lock()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::BlobNotFound(key.to_string()))
    }

    async fn list_by_prefix(
        &self,
        prefix: &str,
        delimiter: Option<char>,
    ) -> StoreResult<Vec<ListItem>> {
        self.tick();
        #[cfg(feature = "failpoints")]
        fail_point!("memory::list", |_| Err(injected("memory::list")));

        let objects = self.read();
        let under_prefix = objects
            .range(prefix.to_string()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix));

        let Some(delimiter) = delimiter else {
            return Ok(under_prefix.map(ListItem::object).collect());
        };

        let mut items = Vec::new();
        let mut prefixes = BTreeSet::new();
        for key in under_prefix {
            let rest = &key[prefix.len()..];
            match rest.find(delimiter) {
                Some(idx) => {
                    let common = &key[..prefix.len() + idx + delimiter.len_utf8()];
                    if prefixes.insert(common.to_string()) {
                        items.push(ListItem::prefix(common));
                    }
                }
                None => items.push(ListItem::object(key.as_str())),
            }
        }
        Ok(items)
    }

    async fn copy(&self, src: &str, dst: &str) -> StoreResult<()> {
        self.tick();
        #[cfg(feature = "failpoints")]
        fail_point!("memory::copy", |_| Err(injected("memory::copy")));

        let mut objects = self.write_lock();
        let source = objects
            .get(src)
            .cloned()
            .ok_or_else(|| StoreError::BlobNotFound(src.to_string()))?;
        let now = Utc::now();
        objects.insert(
            dst.to_string(),
            StoredObject {
                created: now,
                modified: now,
                ..source
            },
        );
        Ok(())
    }
}
