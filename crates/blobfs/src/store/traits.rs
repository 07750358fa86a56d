//! Object store client trait.
//!
//! This is the whole capability set the directory emulation relies on:
//! flat keys, whole-object reads and writes, prefix listing, and a
//! server-side copy. Connection setup, credentials, pooling, and retry
//! policy all live behind an implementation of this trait.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   Storage                        │
//! │     (paths, markers, listing, mutations)         │
//! └───────────────────────┬─────────────────────────┘
//!                         │ uses
//! ┌───────────────────────▼─────────────────────────┐
//! │            ObjectStoreClient trait               │
//! │        (flat keys, no directory notion)          │
//! └───────────────────────┬─────────────────────────┘
//!                         │
//!        ┌────────────────┼────────────────┐
//!        │                │                │
//! ┌──────▼──────┐  ┌──────▼──────┐  ┌──────▼──────┐
//! │InMemoryStore│  │  Azure/S3   │  │   GCS/...   │
//! │ (built-in)  │  │ (your impl) │  │ (your impl) │
//! └─────────────┘  └─────────────┘  └─────────────┘
//! ```
//!
//! Clients backed by a blocking SDK should do their blocking work on a
//! dedicated thread (for example `tokio::task::spawn_blocking`); the core
//! never needs to know which flavor it talks to.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::error::StoreResult;

/// User metadata attached to an object.
pub type ObjectMetadata = HashMap<String, String>;

/// Properties of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectProperties {
    /// Content length in bytes
    pub size: u64,
    /// Last modification time
    pub last_modified: DateTime<Utc>,
    /// Creation time
    pub created: DateTime<Utc>,
    /// User metadata
    pub metadata: ObjectMetadata,
}

/// One entry of a prefix listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Full store key.
    pub key: String,
    /// `true` for a common prefix returned by a delimited listing.
    /// Prefix keys end with the delimiter and have no object behind them.
    pub is_prefix: bool,
}

impl ListItem {
    /// An object entry.
    pub fn object(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_prefix: false,
        }
    }

    /// A common-prefix entry.
    pub fn prefix(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_prefix: true,
        }
    }
}

/// Flat, key-addressed object store client.
///
/// # Contract
///
/// - Missing objects are reported with a not-found [`StoreError`](crate::StoreError)
///   (`BlobNotFound`, `ResourceNotFound`, or a 404 service error).
/// - `write` overwrites unconditionally.
/// - `list_by_prefix` without a delimiter returns every object whose key
///   starts with `prefix`; with a delimiter it returns the objects directly
///   under `prefix` plus one prefix entry per deeper level. Order is
///   unspecified. Pagination is the client's business.
/// - `copy` resolves only after the copy has completed on the server.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`; the client handle is shared
/// across concurrent operations.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Check whether an object exists at `key`.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Fetch properties of the object at `key`.
    async fn get_metadata(&self, key: &str) -> StoreResult<ObjectProperties>;

    /// Read the full content of the object at `key`.
    async fn open_read(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Write `content` to `key` with the given user metadata.
    async fn write(&self, key: &str, content: &[u8], metadata: &ObjectMetadata) -> StoreResult<()>;

    /// Delete the object at `key`.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// List keys under `prefix`, optionally one level only.
    async fn list_by_prefix(
        &self,
        prefix: &str,
        delimiter: Option<char>,
    ) -> StoreResult<Vec<ListItem>>;

    /// Server-side copy of `src` to `dst`, awaiting completion.
    async fn copy(&self, src: &str, dst: &str) -> StoreResult<()>;
}
