//! Local content-addressed cache.
//!
//! Blobs live at `<cache>/files/md5/<hash[0:2]>/<hash[2:]>`. All 256 shard
//! directories are created when the store is opened, so concurrent commits
//! never race on directory creation. New content is staged next to its final
//! path and moved into place without replacing an existing entry: when two
//! writers race on one hash, the first entry wins and later ones are dropped.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use qdvc_domain::{ContentHash, HASH_ALGORITHM};
use rand::Rng;
use tracing::{debug, warn};

use crate::effects::FileSystem;

pub const FILES_DIR: &str = "files";
const SHARD_COUNT: u16 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The hash was already cached; the staged copy was discarded.
    Clash {
        existing_size: u64,
        incoming_size: u64,
    },
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_dir: PathBuf,
    objects_root: PathBuf,
}

impl CacheStore {
    /// Opens the cache rooted at `cache_dir`, creating the shard tree if needed.
    pub fn open(fs: &dyn FileSystem, cache_dir: &Path) -> Result<Self> {
        let objects_root = cache_dir.join(FILES_DIR).join(HASH_ALGORITHM);
        for shard in 0..SHARD_COUNT {
            let dir = objects_root.join(format!("{shard:02x}"));
            fs.create_dir_all(&dir)
                .with_context(|| format!("failed to create cache shard {}", dir.display()))?;
        }
        debug!(cache = %cache_dir.display(), shards = SHARD_COUNT, "cache opened");
        Ok(Self {
            cache_dir: cache_dir.to_path_buf(),
            objects_root,
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn objects_root(&self) -> &Path {
        &self.objects_root
    }

    pub fn path_for(&self, hash: &ContentHash) -> PathBuf {
        self.objects_root.join(hash.shard()).join(hash.remainder())
    }

    pub fn contains(&self, fs: &dyn FileSystem, hash: &ContentHash) -> bool {
        fs.is_file(&self.path_for(hash))
    }

    /// Unique scratch path inside the hash's shard, for staging a download.
    pub fn staging_path(&self, hash: &ContentHash) -> PathBuf {
        let nonce: u64 = rand::thread_rng().gen();
        self.objects_root
            .join(hash.shard())
            .join(format!("{}.{nonce:016x}", hash.remainder()))
    }

    /// Moves `staged` into place as the entry for `hash`.
    ///
    /// An existing entry always wins: the staged file is removed and the two
    /// sizes are reported back for diagnostics. A fresh entry is marked
    /// read-only; failing to do so is logged and otherwise ignored.
    pub fn commit(
        &self,
        fs: &dyn FileSystem,
        staged: &Path,
        hash: &ContentHash,
    ) -> Result<CommitOutcome> {
        let dest = self.path_for(hash);
        if fs.rename_new(staged, &dest)? {
            if let Err(err) = fs.set_read_only(&dest, true) {
                warn!(path = %dest.display(), %err, "failed to mark cache entry read-only");
            }
            debug!(%hash, "cache commit");
            return Ok(CommitOutcome::Committed);
        }

        let existing_size = fs.file_len(&dest).unwrap_or_default();
        let incoming_size = fs.file_len(staged).unwrap_or_default();
        warn!(%hash, existing_size, incoming_size, "cache clash, keeping existing entry");
        if let Err(err) = fs.remove_file(staged) {
            warn!(path = %staged.display(), %err, "failed to discard staged cache file");
        }
        Ok(CommitOutcome::Clash {
            existing_size,
            incoming_size,
        })
    }

    /// Copies `source` into the cache under `hash`.
    pub fn insert_copy(
        &self,
        fs: &dyn FileSystem,
        source: &Path,
        hash: &ContentHash,
    ) -> Result<CommitOutcome> {
        let staged = self.staging_path(hash);
        if let Err(err) = fs.copy(source, &staged) {
            if fs.is_file(&staged) {
                if let Err(cleanup) = fs.remove_file(&staged) {
                    warn!(
                        path = %staged.display(),
                        err = %cleanup,
                        "failed to discard staged cache file"
                    );
                }
            }
            return Err(err);
        }
        self.commit(fs, &staged, hash)
    }
}
