use std::path::{Path, PathBuf};

use anyhow::Result;
use qdvc_domain::{pointer_path_for, working_path_for, ContentHash};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

use super::stats::{Counter, RunSummary, SummaryLine};
use super::{read_hash, TargetClaims};
use crate::config::CommandContext;
use crate::effects::FileSystem;
use crate::store::{CacheStore, CommitOutcome, RemoteStore};
use crate::workers::fan_out;

#[derive(Debug, Default)]
struct PullStats {
    total: Counter,
    pulled: Counter,
    untracked: Counter,
    failed: Counter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PullCounts {
    pub total: usize,
    pub pulled: usize,
    pub untracked: usize,
    pub failed: usize,
}

impl RunSummary for PullCounts {
    fn summary_line(&self) -> String {
        SummaryLine::new(self.total)
            .field("Pulled", self.pulled)
            .field("Untracked", self.untracked)
            .field("Failed", self.failed)
            .finish()
    }

    fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Materializes working files from the cache, downloading missing content first.
///
/// Without a cache the content is downloaded straight to the working file.
pub fn pull(ctx: &CommandContext, remote: &dyn RemoteStore, candidates: Vec<PathBuf>) -> PullCounts {
    let stats = PullStats::default();
    let claims = TargetClaims::default();

    fan_out(candidates, ctx.jobs(), |candidate: PathBuf| {
        pull_candidate(ctx, remote, &claims, &stats, &candidate);
    });

    let counts = PullCounts {
        total: stats.total.get(),
        pulled: stats.pulled.get(),
        untracked: stats.untracked.get(),
        failed: stats.failed.get(),
    };
    ctx.console().out(&counts.summary_line());
    counts
}

fn pull_candidate(
    ctx: &CommandContext,
    remote: &dyn RemoteStore,
    claims: &TargetClaims,
    stats: &PullStats,
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
        console.err(&format!("File {} is not tracked.", candidate.display()));
        stats.untracked.incr();
        return;
    }

    console.out(&format!("Pull     {}", pointer.display()));
    let hash = match read_hash(fs, &pointer) {
        Ok(hash) => hash,
        Err(err) => {
            debug!(%err, "unreadable pointer");
            console.err(&format!("Failed to read hash from {}", pointer.display()));
            stats.failed.incr();
            return;
        }
    };

    let working = working_path_for(&pointer);
    let pulled = match ctx.cache() {
        Some(cache) => pull_through_cache(ctx, remote, cache, &pointer, &working, &hash),
        None => pull_direct(fs, remote, &working, &hash).map(|()| {
            console.out(&format!("REPO ->  {}", working.display()));
        }),
    };
    match pulled {
        Ok(()) => stats.pulled.incr(),
        Err(err) => {
            console.err(&format!("Failed to pull {}: {err:#}", pointer.display()));
            stats.failed.incr();
        }
    }
}

fn pull_through_cache(
    ctx: &CommandContext,
    remote: &dyn RemoteStore,
    cache: &CacheStore,
    pointer: &Path,
    working: &Path,
    hash: &ContentHash,
) -> Result<()> {
    let fs = ctx.fs();
    let console = ctx.console();
    if cache.contains(fs, hash) {
        copy_to_working(fs, &cache.path_for(hash), working)?;
        console.out(&format!("CACHE => {}", working.display()));
        return Ok(());
    }

    let staged = cache.staging_path(hash);
    if let Err(err) = download(fs, remote, hash, &staged) {
        discard_staged(fs, &staged);
        return Err(err);
    }
    console.out(&format!("REPO  => {}", pointer.display()));

    let committed = cache.commit(fs, &staged, hash).inspect_err(|_| {
        discard_staged(fs, &staged);
    })?;
    if let CommitOutcome::Clash {
        existing_size,
        incoming_size,
    } = committed
    {
        console.err(&format!(
            "CLASH    {hash} pulling {} Sizes: {existing_size} {incoming_size}",
            pointer.display()
        ));
    }
    copy_to_working(fs, &cache.path_for(hash), working)
}

fn pull_direct(
    fs: &dyn FileSystem,
    remote: &dyn RemoteStore,
    working: &Path,
    hash: &ContentHash,
) -> Result<()> {
    let staged = sibling_staging_path(working);
    let replaced = download(fs, remote, hash, &staged).and_then(|()| {
        if fs.is_file(working) {
            fs.set_read_only(working, false)?;
        }
        fs.rename_replace(&staged, working)
    });
    if replaced.is_err() {
        discard_staged(fs, &staged);
    }
    replaced
}

/// Scratch path next to `working`, so a finished download replaces it with a rename.
fn sibling_staging_path(working: &Path) -> PathBuf {
    let nonce: u64 = rand::thread_rng().gen();
    let mut name = working.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{nonce:016x}.part"));
    working.with_file_name(name)
}

fn discard_staged(fs: &dyn FileSystem, staged: &Path) {
    if !fs.is_file(staged) {
        return;
    }
    if let Err(err) = fs.remove_file(staged) {
        warn!(
            path = %staged.display(),
            error = %format!("{err:#}"),
            "failed to discard staged download"
        );
    }
}

fn download(
    fs: &dyn FileSystem,
    remote: &dyn RemoteStore,
    hash: &ContentHash,
    dest: &Path,
) -> Result<()> {
    let mut sink = fs.create(dest)?;
    let bytes = remote.download(hash, &mut *sink)?;
    debug!(%hash, bytes, dest = %dest.display(), "downloaded");
    Ok(())
}

/// Cache entries are read-only; the working copy must stay editable.
fn copy_to_working(fs: &dyn FileSystem, cached: &Path, working: &Path) -> Result<()> {
    fs.copy(cached, working)?;
    fs.set_read_only(working, false)
}
