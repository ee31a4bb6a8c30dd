use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use qdvc_domain::DVC_DIR;
use tracing::trace;
use walkdir::WalkDir;

use crate::core::fs::{remove_write_permissions, restore_write_permissions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

pub trait FileSystem: Send + Sync {
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>>;
    fn create(&self, path: &Path) -> Result<Box<dyn Write + Send>>;
    /// Copies `src` over `dest`, replacing a read-only `dest` if needed.
    fn copy(&self, src: &Path, dest: &Path) -> Result<u64>;
    fn file_len(&self, path: &Path) -> Result<u64>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    /// Moves `from` to `to` unless `to` already exists.
    ///
    /// Returns `false` and leaves `from` in place when the destination is taken.
    fn rename_new(&self, from: &Path, to: &Path) -> Result<bool>;
    /// Moves `from` to `to`, replacing any file already there.
    fn rename_replace(&self, from: &Path, to: &Path) -> Result<()>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn set_read_only(&self, path: &Path, read_only: bool) -> Result<()>;
    /// Immediate children of `path`.
    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;
    /// Every regular file below `path`, recursively. `.dvc` directories below
    /// `path` are not entered.
    fn walk_files(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Line-oriented user output with independent standard and diagnostic channels.
pub trait Console: Send + Sync {
    fn out(&self, line: &str);
    fn err(&self, line: &str);
}

pub trait Effects: Send + Sync {
    fn fs(&self) -> &dyn FileSystem;
    fn console(&self) -> &dyn Console;
}

pub type SharedEffects = Arc<dyn Effects>;

pub struct SystemEffects {
    fs: Arc<SystemFileSystem>,
    console: Arc<dyn Console>,
}

impl SystemEffects {
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self::with_console(Arc::new(SystemConsole { quiet }))
    }

    #[must_use]
    pub fn with_console(console: Arc<dyn Console>) -> Self {
        Self {
            fs: Arc::new(SystemFileSystem),
            console,
        }
    }
}

impl Default for SystemEffects {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Effects for SystemEffects {
    fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    fn console(&self) -> &dyn Console {
        self.console.as_ref()
    }
}

pub(crate) struct SystemFileSystem;

impl FileSystem for SystemFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        Ok(Box::new(file))
    }

    fn create(&self, path: &Path) -> Result<Box<dyn Write + Send>> {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn copy(&self, src: &Path, dest: &Path) -> Result<u64> {
        if dest.is_file() {
            restore_write_permissions(dest)?;
        }
        fs::copy(src, dest)
            .with_context(|| format!("copying {} to {}", src.display(), dest.display()))
    }

    fn file_len(&self, path: &Path) -> Result<u64> {
        let meta = fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
        Ok(meta.len())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).with_context(|| format!("removing {}", path.display()))
    }

    fn rename_new(&self, from: &Path, to: &Path) -> Result<bool> {
        // A hard link refuses to replace an existing entry, which makes the claim
        // on `to` atomic. Filesystems without hard links fall back to check-then-rename.
        match fs::hard_link(from, to) {
            Ok(()) => {
                fs::remove_file(from)
                    .with_context(|| format!("removing staged file {}", from.display()))?;
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(err) => {
                trace!(from = %from.display(), %err, "hard link unavailable, renaming");
                if to.exists() {
                    return Ok(false);
                }
                fs::rename(from, to).with_context(|| {
                    format!("moving {} to {}", from.display(), to.display())
                })?;
                Ok(true)
            }
        }
    }

    fn rename_replace(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to)
            .with_context(|| format!("moving {} to {}", from.display(), to.display()))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).with_context(|| format!("creating {}", path.display()))
    }

    fn set_read_only(&self, path: &Path, read_only: bool) -> Result<()> {
        if read_only {
            remove_write_permissions(path)
        } else {
            restore_write_permissions(path)
        }
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("listing {}", path.display()))? {
            let entry = entry.with_context(|| format!("listing {}", path.display()))?;
            let is_dir = entry.file_type().map(|kind| kind.is_dir()).unwrap_or(false);
            entries.push(DirEntry {
                path: entry.path(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn walk_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != DVC_DIR);
        for entry in walker {
            let entry = entry.with_context(|| format!("walking {}", path.display()))?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

pub(crate) struct SystemConsole {
    quiet: bool,
}

impl Console for SystemConsole {
    fn out(&self, line: &str) {
        if self.quiet {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{line}");
    }

    fn err(&self, line: &str) {
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{line}");
    }
}

/// Console that keeps every line in memory, in emission order per channel.
#[derive(Debug, Default)]
pub struct BufferedConsole {
    out: Mutex<Vec<String>>,
    err: Mutex<Vec<String>>,
}

impl BufferedConsole {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout_lines(&self) -> Vec<String> {
        self.out
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stderr_lines(&self) -> Vec<String> {
        self.err
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stdout(&self) -> String {
        self.stdout_lines().join("\n")
    }

    pub fn stderr(&self) -> String {
        self.stderr_lines().join("\n")
    }
}

impl Console for BufferedConsole {
    fn out(&self, line: &str) {
        self.out
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }

    fn err(&self, line: &str) {
        self.err
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}
