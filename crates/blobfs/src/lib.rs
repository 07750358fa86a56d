//! Blobfs - hierarchical, multi-tenant file storage over flat object stores
//!
//! Object stores only know flat keys. Blobfs layers directories (via
//! zero-length marker objects), tenant isolation, listing, recursive delete
//! and tree moves on top of any [`ObjectStoreClient`].
//!
//! # Example
//!
//! ```rust
//! use blobfs::{ObjectMetadata, Storage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = Storage::new();
//!     let tenant = Some("main");
//!
//!     let uri = storage
//!         .put(tenant, "/ns/folder/file.txt", b"hello", &ObjectMetadata::new())
//!         .await?;
//!     assert_eq!(uri.to_string(), "blobfs:///ns/folder/file.txt");
//!
//!     // Ancestors were created on upload.
//!     assert!(storage.exists(tenant, "/ns/folder/").await?);
//!
//!     let names: Vec<String> = storage
//!         .list(tenant, "/ns/folder")
//!         .await?
//!         .into_iter()
//!         .map(|attrs| attrs.name)
//!         .collect();
//!     assert_eq!(names, vec!["file.txt"]);
//!     Ok(())
//! }
//! ```
//!
//! # Custom stores
//!
//! Implement [`ObjectStoreClient`] for your backend and pass it to
//! [`Storage::builder`]:
//!
//! ```rust
//! use std::sync::Arc;
//! use blobfs::{InMemoryStore, Storage, StorageConfig};
//!
//! let storage = Storage::builder()
//!     .client(Arc::new(InMemoryStore::new()))
//!     .config(StorageConfig::new().scheme("assets").marker_name(".dirmarker"))
//!     .build()
//!     .unwrap();
//! assert_eq!(storage.markers().name(), ".dirmarker");
//! ```

mod attributes;
mod blocking;
mod config;
mod error;
mod limits;
mod listing;
mod logging;
mod marker;
mod mutation;
mod path;
mod storage;
mod store;

pub use attributes::{FileAttributes, FileType, attributes_of};
pub use blocking::BlockingStorage;
pub use config::{DEFAULT_MARKER_NAME, DEFAULT_SCHEME, StorageConfig};
pub use error::{Error, Result, StoreError, StoreResult};
pub use limits::{PathLimitExceeded, PathLimits};
pub use listing::{Enumerator, ListedKey, Listing};
pub use logging::{LogConfig, sanitize_for_log};
pub use marker::DirectoryMarkers;
pub use path::{ExternalUri, PathResolver, SEPARATOR, StoreKey};
pub use storage::{Storage, StorageBuilder, StorageObject};
pub use store::{InMemoryStore, ListItem, ObjectMetadata, ObjectProperties, ObjectStoreClient};

/// Re-exported so custom clients can implement [`ObjectStoreClient`].
pub use async_trait::async_trait;
