use std::path::{Path, PathBuf};

use qdvc_domain::pointer_path_for;
use serde::Serialize;
use tracing::debug;

use super::stats::{Counter, RunSummary, SummaryLine};
use super::{read_hash, TargetClaims};
use crate::config::CommandContext;
use crate::store::RemoteStore;
use crate::workers::fan_out;

#[derive(Debug, Default)]
struct RemoteStatusStats {
    total: Counter,
    up_to_date: Counter,
    untracked: Counter,
    not_cached: Counter,
    not_pushed: Counter,
    invalid: Counter,
    failed: Counter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusRemoteCounts {
    pub total: usize,
    pub up_to_date: usize,
    pub untracked: usize,
    pub not_cached: usize,
    pub not_pushed: usize,
    pub invalid: usize,
    pub failed: usize,
}

impl RunSummary for StatusRemoteCounts {
    fn summary_line(&self) -> String {
        SummaryLine::new(self.total)
            .up_to_date(self.up_to_date, self.total)
            .field("Untracked", self.untracked)
            .field("Not cached", self.not_cached)
            .field("Not pushed", self.not_pushed)
            .field("Invalid", self.invalid)
            .field("Failed", self.failed)
            .or_note("Everything is up to date")
            .finish()
    }

    fn has_failures(&self) -> bool {
        self.failed + self.invalid > 0
    }
}

/// Probes the remote for the content of every tracked candidate.
pub fn status_remote(
    ctx: &CommandContext,
    remote: &dyn RemoteStore,
    candidates: Vec<PathBuf>,
) -> StatusRemoteCounts {
    let stats = RemoteStatusStats::default();
    let claims = TargetClaims::default();

    fan_out(candidates, ctx.jobs(), |candidate: PathBuf| {
        probe_candidate(ctx, remote, &claims, &stats, &candidate);
    });

    let counts = StatusRemoteCounts {
        total: stats.total.get(),
        up_to_date: stats.up_to_date.get(),
        untracked: stats.untracked.get(),
        not_cached: stats.not_cached.get(),
        not_pushed: stats.not_pushed.get(),
        invalid: stats.invalid.get(),
        failed: stats.failed.get(),
    };
    ctx.console().out(&counts.summary_line());
    counts
}

fn probe_candidate(
    ctx: &CommandContext,
    remote: &dyn RemoteStore,
    claims: &TargetClaims,
    stats: &RemoteStatusStats,
    candidate: &Path,
) {
    let fs = ctx.fs();
    let console = ctx.console();
    let pointer = pointer_path_for(candidate);
    if !claims.claim(&pointer) {
        return;
    }
    stats.total.incr();
    if !fs.is_file(&pointer) {
        console.out(&format!("Untracked: {}", candidate.display()));
        stats.untracked.incr();
        return;
    }

    let hash = match read_hash(fs, &pointer) {
        Ok(hash) => hash,
        Err(err) => {
            debug!(%err, "unreadable pointer");
            console.out(&format!("Invalid: {}", pointer.display()));
            stats.invalid.incr();
            return;
        }
    };

    let on_remote = match remote.exists(&hash) {
        Ok(found) => found,
        Err(err) => {
            console.err(&format!("Failed to query {}: {err}", pointer.display()));
            stats.failed.incr();
            return;
        }
    };
    let cached = ctx.cache().is_some_and(|cache| cache.contains(fs, &hash));

    let (label, counter) = match (on_remote, cached) {
        (true, true) => ("Up-to-date", &stats.up_to_date),
        (true, false) => ("Not cached", &stats.not_cached),
        (false, _) => ("Not pushed", &stats.not_pushed),
    };
    console.out(&format!("{label}: {}", pointer.display()));
    counter.incr();
}
