//! The per-file synchronization commands.
//!
//! Every command expands its inputs into candidate files, maps each candidate
//! to its pointer file and claims that pointer for the run, so overlapping
//! inputs are processed once. Claimed targets run on the worker pool; each
//! worker reports through console lines and counters only.

pub mod add;
pub mod clean;
pub mod pull;
pub mod push;
pub mod resolve;
pub mod stats;
pub mod status;
pub mod status_remote;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use qdvc_domain::{compute_md5, parse_pointer_hash, ContentHash, PointerEntry, PointerError};
use tracing::trace;

use crate::effects::FileSystem;

pub use add::{add, AddCounts};
pub use clean::{clean, CleanCounts};
pub use pull::{pull, PullCounts};
pub use push::{push, PushCounts};
pub use resolve::{resolve, ResolveError};
pub use stats::RunSummary;
pub use status::{status, StatusCounts};
pub use status_remote::{status_remote, StatusRemoteCounts};

/// Pointer files already taken by a worker in the current run.
#[derive(Debug, Default)]
pub(crate) struct TargetClaims {
    seen: Mutex<HashSet<PathBuf>>,
}

impl TargetClaims {
    /// Returns `true` for the first claim of `pointer`, `false` afterwards.
    pub(crate) fn claim(&self, pointer: &Path) -> bool {
        let fresh = self
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pointer.to_path_buf());
        if !fresh {
            trace!(pointer = %pointer.display(), "already claimed");
        }
        fresh
    }
}

pub(crate) fn read_hash(fs: &dyn FileSystem, pointer: &Path) -> Result<ContentHash, PointerError> {
    if !fs.is_file(pointer) {
        return Err(PointerError::NotFound {
            path: pointer.to_path_buf(),
        });
    }
    let content = fs
        .read_to_string(pointer)
        .map_err(|err| PointerError::Io {
            path: pointer.to_path_buf(),
            message: format!("{err:#}"),
        })?;
    parse_pointer_hash(pointer, &content)
}

pub(crate) fn write_pointer(fs: &dyn FileSystem, pointer: &Path, entry: &PointerEntry) -> Result<()> {
    fs.write(pointer, entry.render().as_bytes())
}

pub(crate) fn hash_file(fs: &dyn FileSystem, path: &Path) -> Result<(ContentHash, u64)> {
    let reader = fs.open_read(path)?;
    let hashed = compute_md5(reader)?;
    Ok(hashed)
}
