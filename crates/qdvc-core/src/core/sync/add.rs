use std::path::{Path, PathBuf};

use qdvc_domain::{is_pointer_path, logical_name, pointer_path_for, ContentHash, PointerEntry};
use serde::Serialize;
use tracing::warn;

use super::stats::{Counter, RunSummary, SummaryLine};
use super::{hash_file, read_hash, write_pointer, TargetClaims};
use crate::config::CommandContext;
use crate::workers::fan_out;

#[derive(Debug, Default)]
struct AddStats {
    total: Counter,
    added: Counter,
    re_added: Counter,
    up_to_date: Counter,
    failed: Counter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddCounts {
    pub total: usize,
    pub added: usize,
    pub re_added: usize,
    pub up_to_date: usize,
    pub failed: usize,
}

impl AddStats {
    fn snapshot(&self) -> AddCounts {
        AddCounts {
            total: self.total.get(),
            added: self.added.get(),
            re_added: self.re_added.get(),
            up_to_date: self.up_to_date.get(),
            failed: self.failed.get(),
        }
    }
}

impl RunSummary for AddCounts {
    fn summary_line(&self) -> String {
        SummaryLine::new(self.total)
            .field("Added", self.added)
            .field("Re-added", self.re_added)
            .field("Up-to-date", self.up_to_date)
            .field("Failed", self.failed)
            .finish()
    }

    fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Tracks data files: writes their pointer files and copies them into the cache.
///
/// Pointer files among the candidates are skipped. A file whose pointer already
/// records its current hash is left alone.
pub fn add(ctx: &CommandContext, candidates: Vec<PathBuf>) -> AddCounts {
    let stats = AddStats::default();
    let claims = TargetClaims::default();
    let targets = candidates
        .into_iter()
        .filter(|candidate| !is_pointer_path(candidate))
        .collect();

    fan_out(targets, ctx.jobs(), |file: PathBuf| {
        add_file(ctx, &claims, &stats, &file);
    });

    let counts = stats.snapshot();
    ctx.console().out(&counts.summary_line());
    counts
}

fn add_file(ctx: &CommandContext, claims: &TargetClaims, stats: &AddStats, file: &Path) {
    let fs = ctx.fs();
    let console = ctx.console();
    let pointer = pointer_path_for(file);
    if !claims.claim(&pointer) {
        return;
    }
    if !fs.is_file(file) {
        console.err(&format!("File {} does not exist.", file.display()));
        return;
    }
    stats.total.incr();

    let (hash, size) = match hash_file(fs, file) {
        Ok(hashed) => hashed,
        Err(err) => {
            console.err(&format!("Failed to add {}: {err:#}", file.display()));
            stats.failed.incr();
            return;
        }
    };

    let tracked = fs.is_file(&pointer);
    if tracked && read_hash(fs, &pointer).ok().as_ref() == Some(&hash) {
        stats.up_to_date.incr();
        return;
    }

    let entry = PointerEntry::new(hash.clone(), size, logical_name(file));
    if let Err(err) = write_pointer(fs, &pointer, &entry) {
        console.err(&format!("Failed to add {}: {err:#}", file.display()));
        stats.failed.incr();
        return;
    }

    let operation = if tracked {
        stats.re_added.incr();
        "Re-added"
    } else {
        stats.added.incr();
        "Added"
    };
    let cached = copy_to_cache(ctx, file, &hash);
    console.out(&format!("{operation} {} ({cached})", file.display()));
}

fn copy_to_cache(ctx: &CommandContext, file: &Path, hash: &ContentHash) -> &'static str {
    let Some(cache) = ctx.cache() else {
        return "No cache";
    };
    if cache.contains(ctx.fs(), hash) {
        return "Cached";
    }
    match cache.insert_copy(ctx.fs(), file, hash) {
        Ok(_) => "Cached",
        Err(err) => {
            warn!(path = %file.display(), %hash, error = %format!("{err:#}"), "failed to cache file");
            "Failed to cache"
        }
    }
}
