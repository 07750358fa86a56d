//! File vs. directory classification and entry attributes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::StoreResult;
use crate::marker::DirectoryMarkers;
use crate::path::StoreKey;
use crate::store::{ObjectMetadata, ObjectStoreClient};

/// Entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileType {
    /// Regular object
    File,
    /// Directory (marker present)
    Directory,
}

impl FileType {
    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }
}

/// Attributes of a file or directory entry.
///
/// Directory timestamps come from the marker object; directory size is
/// always 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileAttributes {
    /// Entry name (last path segment)
    pub name: String,
    /// Entry type
    pub file_type: FileType,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub last_modified: DateTime<Utc>,
    /// Creation time
    pub created: DateTime<Utc>,
    /// User metadata
    pub metadata: ObjectMetadata,
}

impl FileAttributes {
    /// Whether this entry is a directory.
    pub fn is_directory(&self) -> bool {
        self.file_type.is_dir()
    }
}

/// Resolve attributes for a store key.
///
/// The directory form is tested first, so a key carrying both a marker and a
/// same-named object reports as a directory. Fails with a not-found store
/// error when neither exists.
pub async fn attributes_of(
    client: &dyn ObjectStoreClient,
    markers: &DirectoryMarkers,
    key: &StoreKey,
) -> StoreResult<FileAttributes> {
    let name = key.name().to_string();

    match client.get_metadata(markers.marker_key_for(key).as_str()).await {
        Ok(props) => {
            return Ok(FileAttributes {
                name,
                file_type: FileType::Directory,
                size: 0,
                last_modified: props.last_modified,
                created: props.created,
                metadata: props.metadata,
            });
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }

    let props = client.get_metadata(key.as_str()).await?;
    Ok(FileAttributes {
        name,
        file_type: FileType::File,
        size: props.size,
        last_modified: props.last_modified,
        created: props.created,
        metadata: props.metadata,
    })
}
