//! Local cache and remote blob stores.

pub mod cache;
pub mod remote;

use std::path::{Path, PathBuf};

use qdvc_domain::{default_cache_dir, find_dvc_dir};
use serde::Serialize;

use crate::config::{Config, RepoConfig};
use crate::core::fs::absolutize;

pub use cache::{CacheStore, CommitOutcome};
pub use remote::{HttpRemote, RemoteError, RemoteStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheLocation {
    pub path: PathBuf,
    pub source: &'static str,
}

/// Picks the cache directory: environment override, then `cache.dir`, then
/// the `.dvc/cache` folder of the repository holding `first_file`.
pub fn resolve_cache_location(
    config: &Config,
    repo_config: Option<&RepoConfig>,
    first_file: Option<&Path>,
    cwd: &Path,
) -> Option<CacheLocation> {
    if let Some(path) = &config.cache_dir_override {
        return Some(CacheLocation {
            path: absolutize(cwd, path),
            source: "QDVC_CACHE_DIR",
        });
    }
    if let Some(path) = repo_config.and_then(RepoConfig::cache_dir) {
        return Some(CacheLocation {
            path,
            source: "cache.dir",
        });
    }
    let dvc_dir = find_dvc_dir(first_file?)?;
    Some(CacheLocation {
        path: default_cache_dir(&dvc_dir),
        source: ".dvc/cache",
    })
}
