use std::path::{Path, PathBuf};

use anyhow::Result;
use qdvc_domain::{pointer_path_for, working_path_for};
use serde::Serialize;
use tracing::debug;

use super::stats::{Counter, RunSummary, SummaryLine};
use super::{hash_file, read_hash, TargetClaims};
use crate::config::CommandContext;
use crate::workers::fan_out;

#[derive(Debug, Default)]
struct CleanStats {
    total: Counter,
    removed: Counter,
    skipped_modified: Counter,
    failed: Counter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanCounts {
    pub total: usize,
    pub removed: usize,
    pub skipped_modified: usize,
    pub failed: usize,
}

impl RunSummary for CleanCounts {
    fn summary_line(&self) -> String {
        SummaryLine::new(self.total)
            .field("Removed", self.removed)
            .field("Skipped (modified)", self.skipped_modified)
            .field("Failed", self.failed)
            .or_note("all clean")
            .finish()
    }

    fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Deletes working files whose content is safely recorded by their pointer.
///
/// Modified working files are kept unless `force` is set. Candidates without a
/// pointer file are ignored.
pub fn clean(ctx: &CommandContext, candidates: Vec<PathBuf>, force: bool) -> CleanCounts {
    let stats = CleanStats::default();
    let claims = TargetClaims::default();

    fan_out(candidates, ctx.jobs(), |candidate: PathBuf| {
        clean_candidate(ctx, &claims, &stats, &candidate, force);
    });

    let counts = CleanCounts {
        total: stats.total.get(),
        removed: stats.removed.get(),
        skipped_modified: stats.skipped_modified.get(),
        failed: stats.failed.get(),
    };
    ctx.console().out(&counts.summary_line());
    counts
}

fn clean_candidate(
    ctx: &CommandContext,
    claims: &TargetClaims,
    stats: &CleanStats,
    candidate: &Path,
    force: bool,
) {
    let fs = ctx.fs();
    let console = ctx.console();
    let pointer = pointer_path_for(candidate);
    if !fs.is_file(&pointer) || !claims.claim(&pointer) {
        return;
    }
    stats.total.incr();

    let working = working_path_for(&pointer);
    if !fs.is_file(&working) {
        return;
    }

    match clean_working(ctx, &pointer, &working, force) {
        Ok(true) => {
            console.out(&format!("Removed: {}", working.display()));
            stats.removed.incr();
        }
        Ok(false) => {
            console.out(&format!("Skip (modified): {}", working.display()));
            stats.skipped_modified.incr();
        }
        Err(err) => {
            console.err(&format!("Failed: {}\n  {err:#}", working.display()));
            stats.failed.incr();
        }
    }
}

/// Returns `false` when the file was kept because it no longer matches its pointer.
fn clean_working(ctx: &CommandContext, pointer: &Path, working: &Path, force: bool) -> Result<bool> {
    let fs = ctx.fs();
    if !force {
        let (current, _) = hash_file(fs, working)?;
        let matches = read_hash(fs, pointer).is_ok_and(|recorded| recorded == current);
        if !matches {
            return Ok(false);
        }
    }
    if let Err(err) = fs.set_read_only(working, false) {
        debug!(path = %working.display(), error = %format!("{err:#}"), "could not restore write access");
    }
    fs.remove_file(working)?;
    Ok(true)
}
