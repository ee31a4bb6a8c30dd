//! Expands user path expressions into candidate files.
//!
//! An expression is a literal file, a directory (every file below it), or a
//! pattern with `*`/`?` wildcards in any number of segments. Wildcard segments
//! match directory entries one level at a time; a directory matched by the
//! last segment contributes every file below it. The repository's own
//! `.dvc` directory is never matched by a wildcard or entered by a walk.

use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use qdvc_domain::DVC_DIR;
use tracing::{trace, warn};

use crate::effects::FileSystem;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("wildcards are not allowed in the root of {0}")]
    WildcardInRoot(PathBuf),
    #[error("invalid pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },
}

fn has_wildcard(text: &OsStr) -> bool {
    text.to_string_lossy().contains(['*', '?'])
}

/// Resolves `expression` to the files it denotes. A path that matches nothing yields no files.
pub fn resolve(fs: &dyn FileSystem, expression: &Path) -> Result<Vec<PathBuf>, ResolveError> {
    let mut files = Vec::new();
    if !has_wildcard(expression.as_os_str()) {
        expand_existing(fs, expression, &mut files);
        return Ok(files);
    }

    let mut base = PathBuf::new();
    let mut segments = Vec::new();
    for component in expression.components() {
        match component {
            Component::Prefix(prefix) if has_wildcard(prefix.as_os_str()) => {
                return Err(ResolveError::WildcardInRoot(expression.to_path_buf()));
            }
            Component::Prefix(_) | Component::RootDir if segments.is_empty() => {
                base.push(component);
            }
            other => segments.push(other.as_os_str().to_owned()),
        }
    }

    let matchers = segments
        .iter()
        .map(|segment| Segment::new(segment))
        .collect::<Result<Vec<_>, _>>()?;
    expand(fs, &base, &matchers, &mut files);
    trace!(expression = %expression.display(), files = files.len(), "resolved pattern");
    Ok(files)
}

enum Segment {
    Literal(OsString),
    Pattern(GlobMatcher),
}

impl Segment {
    fn new(text: &OsStr) -> Result<Self, ResolveError> {
        if !has_wildcard(text) {
            return Ok(Segment::Literal(text.to_owned()));
        }
        let pattern = escape_brackets(&text.to_string_lossy());
        let glob = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .case_insensitive(cfg!(windows))
            .build()
            .map_err(|err| ResolveError::Pattern {
                pattern: text.to_string_lossy().into_owned(),
                message: err.to_string(),
            })?;
        Ok(Segment::Pattern(glob.compile_matcher()))
    }
}

// Only `*` and `?` are wildcards; character classes and alternations are literal.
fn escape_brackets(segment: &str) -> String {
    let mut escaped = String::with_capacity(segment.len());
    for ch in segment.chars() {
        match ch {
            '[' | ']' | '{' | '}' => {
                escaped.push('[');
                escaped.push(ch);
                escaped.push(']');
            }
            other => escaped.push(other),
        }
    }
    escaped
}

fn expand(fs: &dyn FileSystem, base: &Path, segments: &[Segment], files: &mut Vec<PathBuf>) {
    let Some((segment, rest)) = segments.split_first() else {
        expand_existing(fs, base, files);
        return;
    };
    match segment {
        Segment::Literal(name) => expand(fs, &base.join(name), rest, files),
        Segment::Pattern(matcher) => {
            let listing = if base.as_os_str().is_empty() {
                Path::new(".")
            } else {
                base
            };
            if !fs.is_dir(listing) {
                return;
            }
            let entries = match fs.list_dir(listing) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %listing.display(), %err, "failed to list directory");
                    return;
                }
            };
            for entry in entries {
                let Some(name) = entry.path.file_name() else {
                    continue;
                };
                if name == DVC_DIR || !matcher.is_match(Path::new(name)) {
                    continue;
                }
                let candidate = base.join(name);
                if rest.is_empty() {
                    expand_existing(fs, &candidate, files);
                } else if entry.is_dir {
                    expand(fs, &candidate, rest, files);
                }
            }
        }
    }
}

fn expand_existing(fs: &dyn FileSystem, path: &Path, files: &mut Vec<PathBuf>) {
    if fs.is_file(path) {
        files.push(path.to_path_buf());
    } else if fs.is_dir(path) {
        match fs.walk_files(path) {
            Ok(found) => files.extend(found),
            Err(err) => warn!(path = %path.display(), %err, "failed to walk directory"),
        }
    }
}
