use std::path::{Path, PathBuf};

use qdvc_domain::{is_pointer_path, pointer_path_for, working_path_for};
use serde::Serialize;
use tracing::debug;

use super::stats::{Counter, RunSummary, SummaryLine};
use super::{hash_file, read_hash, TargetClaims};
use crate::config::CommandContext;
use crate::workers::fan_out;

#[derive(Debug, Default)]
struct StatusStats {
    total: Counter,
    up_to_date: Counter,
    untracked: Counter,
    modified: Counter,
    not_in_cache: Counter,
    missing: Counter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub up_to_date: usize,
    pub untracked: usize,
    pub modified: usize,
    pub not_in_cache: usize,
    pub missing: usize,
}

impl RunSummary for StatusCounts {
    fn summary_line(&self) -> String {
        SummaryLine::new(self.total)
            .up_to_date(self.up_to_date, self.total)
            .field("Untracked", self.untracked)
            .field("Modified", self.modified)
            .field("Not in cache", self.not_in_cache)
            .field("Missing", self.missing)
            .or_note("Everything is up to date")
            .finish()
    }

    fn has_failures(&self) -> bool {
        false
    }
}

/// Compares working files against their pointer files and the local cache.
///
/// A pointer file is only reported on its own when its working file is gone;
/// otherwise the working file stands for it. Up-to-date and untracked files
/// are counted but not listed.
pub fn status(ctx: &CommandContext, candidates: Vec<PathBuf>) -> StatusCounts {
    let fs = ctx.fs();
    let stats = StatusStats::default();
    let claims = TargetClaims::default();
    let targets = candidates
        .into_iter()
        .filter(|candidate| !(is_pointer_path(candidate) && fs.is_file(&working_path_for(candidate))))
        .collect();

    fan_out(targets, ctx.jobs(), |file: PathBuf| {
        file_status(ctx, &claims, &stats, &file);
    });

    let counts = StatusCounts {
        total: stats.total.get(),
        up_to_date: stats.up_to_date.get(),
        untracked: stats.untracked.get(),
        modified: stats.modified.get(),
        not_in_cache: stats.not_in_cache.get(),
        missing: stats.missing.get(),
    };
    ctx.console().out(&counts.summary_line());
    counts
}

fn file_status(ctx: &CommandContext, claims: &TargetClaims, stats: &StatusStats, file: &Path) {
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

    if is_pointer_path(file) {
        console.out(&format!("Missing: {}", working_path_for(file).display()));
        stats.missing.incr();
        return;
    }
    if !fs.is_file(&pointer) {
        stats.untracked.incr();
        return;
    }

    let current = match hash_file(fs, file) {
        Ok((hash, _)) => Some(hash),
        Err(err) => {
            debug!(path = %file.display(), error = %format!("{err:#}"), "failed to hash");
            None
        }
    };
    let recorded = read_hash(fs, &pointer).ok();
    let hash = match (current, recorded) {
        (Some(current), Some(recorded)) if current == recorded => current,
        _ => {
            console.out(&format!("Modified: {}", file.display()));
            stats.modified.incr();
            return;
        }
    };

    if ctx.cache().is_some_and(|cache| cache.contains(fs, &hash)) {
        stats.up_to_date.incr();
    } else {
        console.out(&format!("Not in cache: {}", file.display()));
        stats.not_in_cache.incr();
    }
}
