use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

/// Clears every write bit (unix) or sets the read-only attribute (elsewhere).
pub(crate) fn remove_write_permissions(path: &Path) -> Result<()> {
    let metadata =
        fs::symlink_metadata(path).with_context(|| format!("failed to stat {}", path.display()))?;
    if metadata.file_type().is_symlink() {
        return Ok(());
    }
    let mut perms = metadata.permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = perms.mode();
        let new_mode = mode & !0o222;
        if mode != new_mode {
            perms.set_mode(new_mode);
            fs::set_permissions(path, perms)
                .with_context(|| format!("failed to mark {} read-only", path.display()))?;
        }
    }
    #[cfg(not(unix))]
    {
        if !perms.readonly() {
            perms.set_readonly(true);
            fs::set_permissions(path, perms)
                .with_context(|| format!("failed to mark {} read-only", path.display()))?;
        }
    }
    Ok(())
}

/// Restores owner write access on a file previously hardened read-only.
pub(crate) fn restore_write_permissions(path: &Path) -> Result<()> {
    let metadata =
        fs::symlink_metadata(path).with_context(|| format!("failed to stat {}", path.display()))?;
    if metadata.file_type().is_symlink() {
        return Ok(());
    }
    let mut perms = metadata.permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = perms.mode();
        let new_mode = mode | 0o200;
        if mode != new_mode {
            perms.set_mode(new_mode);
            fs::set_permissions(path, perms)
                .with_context(|| format!("failed to make {} writable", path.display()))?;
        }
    }
    #[cfg(not(unix))]
    {
        if perms.readonly() {
            perms.set_readonly(false);
            fs::set_permissions(path, perms)
                .with_context(|| format!("failed to make {} writable", path.display()))?;
        }
    }
    Ok(())
}

/// Resolves `.` and `..` without touching the filesystem.
pub(crate) fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Makes `path` absolute against `base` and normalizes it.
pub(crate) fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_lexically(path)
    } else {
        normalize_lexically(&base.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_parent_segments() {
        let path = Path::new("/work/repo/.dvc/../../local/repo");
        assert_eq!(normalize_lexically(path), PathBuf::from("/work/local/repo"));
        assert_eq!(
            absolutize(Path::new("/work/repo"), Path::new("./data/../cache")),
            PathBuf::from("/work/repo/cache")
        );
        assert_eq!(
            absolutize(Path::new("/ignored"), Path::new("/abs/./x")),
            PathBuf::from("/abs/x")
        );
    }

    #[test]
    fn write_permissions_toggle() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let file = tmp.path().join("blob");
        fs::write(&file, b"payload").expect("write");

        remove_write_permissions(&file).expect("harden");
        assert!(fs::metadata(&file).expect("meta").permissions().readonly());

        restore_write_permissions(&file).expect("restore");
        assert!(!fs::metadata(&file).expect("meta").permissions().readonly());
    }
}
