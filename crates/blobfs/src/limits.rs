//! Path limits applied before a path is turned into a store key.
//!
//! Object stores accept nearly any key, so these limits are what keeps
//! pathological paths (very deep trees, huge segments, control characters)
//! out of the key space. Each write materializes one marker per ancestor,
//! which makes depth a cost multiplier as well.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default maximum path depth (directory nesting): 100
pub const DEFAULT_MAX_PATH_DEPTH: usize = 100;

/// Default maximum segment (single component) length: 255 bytes
pub const DEFAULT_MAX_SEGMENT_LENGTH: usize = 255;

/// Default maximum total path length: 4096 bytes
pub const DEFAULT_MAX_PATH_LENGTH: usize = 4096;

/// Path limits.
///
/// # Default Limits
///
/// | Limit | Default | Purpose |
/// |-------|---------|---------|
/// | `max_path_depth` | 100 | Directory nesting depth |
/// | `max_segment_length` | 255 | Single path component |
/// | `max_path_length` | 4096 | Total path length |
///
/// # Example
///
/// ```rust
/// use blobfs::PathLimits;
///
/// let limits = PathLimits::new().max_path_depth(16);
/// assert!(limits.validate_path("/a/b/c").is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathLimits {
    /// Maximum directory nesting depth.
    pub max_path_depth: usize,

    /// Maximum length of a single path segment in bytes.
    pub max_segment_length: usize,

    /// Maximum total path length in bytes.
    pub max_path_length: usize,
}

impl Default for PathLimits {
    fn default() -> Self {
        Self {
            max_path_depth: DEFAULT_MAX_PATH_DEPTH,
            max_segment_length: DEFAULT_MAX_SEGMENT_LENGTH,
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
        }
    }
}

impl PathLimits {
    /// Create new limits with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create unlimited limits (no restrictions).
    ///
    /// Unsafe characters are still rejected.
    pub fn unlimited() -> Self {
        Self {
            max_path_depth: usize::MAX,
            max_segment_length: usize::MAX,
            max_path_length: usize::MAX,
        }
    }

    /// Set maximum path depth (directory nesting).
    pub fn max_path_depth(mut self, depth: usize) -> Self {
        self.max_path_depth = depth;
        self
    }

    /// Set maximum segment length.
    pub fn max_segment_length(mut self, len: usize) -> Self {
        self.max_segment_length = len;
        self
    }

    /// Set maximum total path length.
    pub fn max_path_length(mut self, len: usize) -> Self {
        self.max_path_length = len;
        self
    }

    /// Validate a `/`-separated path against depth, length, and character
    /// safety limits.
    ///
    /// Traversal segments are not handled here; the resolver rejects them
    /// before calling this.
    pub fn validate_path(&self, path: &str) -> Result<(), PathLimitExceeded> {
        if path.len() > self.max_path_length {
            return Err(PathLimitExceeded::PathTooLong {
                length: path.len(),
                limit: self.max_path_length,
            });
        }

        let mut depth: usize = 0;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if segment.len() > self.max_segment_length {
                return Err(PathLimitExceeded::SegmentTooLong {
                    length: segment.len(),
                    limit: self.max_segment_length,
                });
            }

            if let Some(bad_char) = find_unsafe_path_char(segment) {
                return Err(PathLimitExceeded::UnsafePathChar {
                    character: bad_char,
                    segment: segment.to_string(),
                });
            }

            depth += 1;
        }

        if depth > self.max_path_depth {
            return Err(PathLimitExceeded::PathTooDeep {
                depth,
                limit: self.max_path_depth,
            });
        }

        Ok(())
    }
}

/// Check if a path segment contains unsafe characters.
///
/// Returns `Some(description)` for the first unsafe character found.
/// Rejects: ASCII control chars (0x00-0x1F, 0x7F), C1 controls (0x80-0x9F),
/// and Unicode bidi override characters (U+202A-U+202E, U+2066-U+2069).
fn find_unsafe_path_char(segment: &str) -> Option<String> {
    for ch in segment.chars() {
        if ch.is_ascii_control() {
            return Some(format!("U+{:04X}", ch as u32));
        }
        if ('\u{0080}'..='\u{009F}').contains(&ch) {
            return Some(format!("U+{:04X}", ch as u32));
        }
        if ('\u{202A}'..='\u{202E}').contains(&ch) || ('\u{2066}'..='\u{2069}').contains(&ch) {
            return Some(format!("U+{:04X} (bidi override)", ch as u32));
        }
    }
    None
}

/// Error returned when a path limit is exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathLimitExceeded {
    /// Path depth (nesting) exceeds limit.
    PathTooDeep { depth: usize, limit: usize },
    /// Single segment exceeds length limit.
    SegmentTooLong { length: usize, limit: usize },
    /// Total path exceeds length limit.
    PathTooLong { length: usize, limit: usize },
    /// Path contains an unsafe character.
    UnsafePathChar { character: String, segment: String },
}

impl fmt::Display for PathLimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathLimitExceeded::PathTooDeep { depth, limit } => {
                write!(f, "path too deep: {depth} levels exceeds {limit} level limit")
            }
            PathLimitExceeded::SegmentTooLong { length, limit } => {
                write!(f, "segment too long: {length} bytes exceeds {limit} byte limit")
            }
            PathLimitExceeded::PathTooLong { length, limit } => {
                write!(f, "path too long: {length} bytes exceeds {limit} byte limit")
            }
            PathLimitExceeded::UnsafePathChar { character, segment } => {
                write!(f, "unsafe character {character} in path segment '{segment}'")
            }
        }
    }
}

impl std::error::Error for PathLimitExceeded {}
