//! Pointer file codec.
//!
//! A pointer file sits next to the data file it tracks (`<file>.dvc`) and
//! records the content hash, the size and the base name of the data file:
//!
//! ```text
//! outs:
//! - md5: e4d909c290d0fb1ca068ffaddf22cbd0
//!   size: 44
//!   hash: md5
//!   path: file.txt
//!
//! ```
//!
//! The layout is reproduced byte for byte so pointer files written here stay
//! interchangeable with ones written by DVC itself.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::hash::{ContentHash, HASH_ALGORITHM, HASH_HEX_LEN};

pub const POINTER_EXTENSION: &str = "dvc";

const HASH_MARKER: &str = "md5: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerEntry {
    pub hash: ContentHash,
    pub size: u64,
    pub logical_name: String,
}

impl PointerEntry {
    pub fn new(hash: ContentHash, size: u64, logical_name: impl Into<String>) -> Self {
        Self {
            hash,
            size,
            logical_name: logical_name.into(),
        }
    }

    /// Serializes the entry in the fixed pointer layout, trailing blank line included.
    pub fn render(&self) -> String {
        format!(
            "outs:\n- md5: {}\n  size: {}\n  hash: {HASH_ALGORITHM}\n  path: {}\n\n",
            self.hash, self.size, self.logical_name
        )
    }
}

/// Why a pointer file could not yield a hash. Callers treat every variant the
/// same way ("cannot determine state"); the split only feeds diagnostics.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PointerError {
    #[error("pointer file {} not found", path.display())]
    NotFound { path: PathBuf },
    #[error("pointer file {} has no readable md5 field", path.display())]
    Malformed { path: PathBuf },
    #[error("failed to read pointer file {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

/// Extracts the hash recorded in pointer file `content`.
pub fn parse_pointer_hash(path: &Path, content: &str) -> Result<ContentHash, PointerError> {
    let malformed = || PointerError::Malformed {
        path: path.to_path_buf(),
    };
    let start = content.find(HASH_MARKER).ok_or_else(malformed)? + HASH_MARKER.len();
    let digest = content
        .get(start..start + HASH_HEX_LEN)
        .ok_or_else(malformed)?;
    ContentHash::parse(digest).map_err(|_| malformed())
}

pub fn is_pointer_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(POINTER_EXTENSION))
}

/// Maps a candidate path to its pointer file; pointer paths map to themselves.
pub fn pointer_path_for(candidate: &Path) -> PathBuf {
    if is_pointer_path(candidate) {
        return candidate.to_path_buf();
    }
    let mut raw: OsString = candidate.as_os_str().to_owned();
    raw.push(".");
    raw.push(POINTER_EXTENSION);
    PathBuf::from(raw)
}

/// The data file a pointer file tracks.
pub fn working_path_for(pointer: &Path) -> PathBuf {
    if is_pointer_path(pointer) {
        pointer.with_extension("")
    } else {
        pointer.to_path_buf()
    }
}

/// Base name recorded in the `path:` field.
pub fn logical_name(working: &Path) -> String {
    working
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
