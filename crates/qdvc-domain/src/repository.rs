use std::path::{Path, PathBuf};

/// Marker directory at the root of a DVC repository.
pub const DVC_DIR: &str = ".dvc";
pub const DEFAULT_CACHE_DIR: &str = "cache";

/// Walks up from `start` looking for the `.dvc` directory.
///
/// `start` may be a file or a directory; anything else yields `None`.
pub fn find_dvc_dir(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_file() {
        start.parent()?.to_path_buf()
    } else if start.is_dir() {
        start.to_path_buf()
    } else {
        return None;
    };
    loop {
        let candidate = dir.join(DVC_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Cache directory used when nothing overrides it: `<repo>/.dvc/cache`.
pub fn default_cache_dir(dvc_dir: &Path) -> PathBuf {
    dvc_dir.join(DEFAULT_CACHE_DIR)
}
