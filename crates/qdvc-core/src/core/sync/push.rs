use std::path::{Path, PathBuf};

use anyhow::Result;
use qdvc_domain::{pointer_path_for, working_path_for, ContentHash};
use serde::Serialize;
use tracing::debug;

use super::stats::{Counter, RunSummary, SummaryLine};
use super::{read_hash, TargetClaims};
use crate::config::CommandContext;
use crate::store::{CacheStore, RemoteStore};
use crate::workers::fan_out;

#[derive(Debug, Default)]
struct PushStats {
    total: Counter,
    pushed: Counter,
    already_pushed: Counter,
    not_cached: Counter,
    untracked: Counter,
    failed: Counter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PushCounts {
    pub total: usize,
    pub pushed: usize,
    pub already_pushed: usize,
    pub not_cached: usize,
    pub untracked: usize,
    pub failed: usize,
}

impl RunSummary for PushCounts {
    fn summary_line(&self) -> String {
        SummaryLine::new(self.total)
            .field("Pushed", self.pushed)
            .field("Already pushed", self.already_pushed)
            .field("Not cached", self.not_cached)
            .field("Untracked", self.untracked)
            .field("Failed", self.failed)
            .finish()
    }

    fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Uploads cached content for tracked files the remote does not have yet.
///
/// Content only ever comes from the cache, never from working files.
pub fn push(ctx: &CommandContext, remote: &dyn RemoteStore, candidates: Vec<PathBuf>) -> PushCounts {
    let stats = PushStats::default();
    let claims = TargetClaims::default();

    fan_out(candidates, ctx.jobs(), |candidate: PathBuf| {
        push_candidate(ctx, remote, &claims, &stats, &candidate);
    });

    let counts = PushCounts {
        total: stats.total.get(),
        pushed: stats.pushed.get(),
        already_pushed: stats.already_pushed.get(),
        not_cached: stats.not_cached.get(),
        untracked: stats.untracked.get(),
        failed: stats.failed.get(),
    };
    ctx.console().out(&counts.summary_line());
    counts
}

fn push_candidate(
    ctx: &CommandContext,
    remote: &dyn RemoteStore,
    claims: &TargetClaims,
    stats: &PushStats,
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

    let Some(cache) = ctx.cache() else {
        console.err("No DVC cache to take the file content from.");
        stats.failed.incr();
        return;
    };

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
    if !cache.contains(fs, &hash) {
        console.err(&format!(
            "File for {} ({hash}) not found in the cache.",
            working.display()
        ));
        stats.not_cached.incr();
        return;
    }

    match upload_if_missing(ctx, remote, cache, &hash) {
        Ok(true) => {
            console.out(&format!("Pushed {}", working.display()));
            stats.pushed.incr();
        }
        Ok(false) => {
            console.out(&format!("Existing {}", working.display()));
            stats.already_pushed.incr();
        }
        Err(err) => {
            console.err(&format!("Failed to push {}: {err:#}", working.display()));
            stats.failed.incr();
        }
    }
}

/// Returns `false` when the remote already holds `hash`.
fn upload_if_missing(
    ctx: &CommandContext,
    remote: &dyn RemoteStore,
    cache: &CacheStore,
    hash: &ContentHash,
) -> Result<bool> {
    if remote.exists(hash)? {
        return Ok(false);
    }
    let fs = ctx.fs();
    let cached = cache.path_for(hash);
    let size = fs.file_len(&cached)?;
    let body = fs.open_read(&cached)?;
    remote.upload(hash, body, size)?;
    debug!(%hash, size, "uploaded");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use httptest::{matchers::*, responders::*, Expectation};

    use super::*;
    use crate::sync::testing::{http_remote, start_server, Fixture, FOX, FOX_MD5};

    const FOX_PATH: &str = "/repo/files/md5/e4/d909c290d0fb1ca068ffaddf22cbd0";
    const OTHER_MD5: &str = "8b5dc2bafbe03346676bd13095d02cec";
    const OTHER_PATH: &str = "/repo/files/md5/8b/5dc2bafbe03346676bd13095d02cec";

    #[test]
    fn uploads_cached_content_missing_from_remote() {
        let Some(server) = start_server("uploads_cached_content_missing_from_remote") else {
            return;
        };
        server.expect(
            Expectation::matching(request::method_path("HEAD", FOX_PATH))
                .respond_with(status_code(404)),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("PUT", FOX_PATH),
                request::body(matches("^The quick brown fox jumps")),
            ])
            .respond_with(status_code(201)),
        );
        let fx = Fixture::new();
        fx.write_pointer("file.txt", FOX_MD5, 44);
        fx.write_cached(FOX_MD5, FOX);
        let remote = http_remote(&server);
        let ctx = fx.remote_context(true, remote.clone());

        let counts = push(&ctx, remote.as_ref(), vec![fx.path("file.txt.dvc")]);

        assert_eq!(counts.pushed, 1);
        assert_eq!(
            fx.stdout(),
            vec![
                format!("Pushed {}", fx.path("file.txt").display()),
                "Total files: 1, Pushed: 1".to_string(),
            ]
        );
    }

    #[test]
    fn existing_remote_content_is_not_uploaded() {
        let Some(server) = start_server("existing_remote_content_is_not_uploaded") else {
            return;
        };
        server.expect(
            Expectation::matching(request::method_path("HEAD", FOX_PATH))
                .respond_with(status_code(200)),
        );
        let fx = Fixture::new();
        fx.write_pointer("file.txt", FOX_MD5, 44);
        fx.write_cached(FOX_MD5, FOX);
        let remote = http_remote(&server);
        let ctx = fx.remote_context(true, remote.clone());

        let counts = push(&ctx, remote.as_ref(), vec![fx.path("file.txt")]);

        assert_eq!(counts.already_pushed, 1);
        assert!(fx
            .stdout()
            .contains(&format!("Existing {}", fx.path("file.txt").display())));
    }

    #[test]
    fn content_missing_from_cache_is_not_cached() {
        let Some(server) = start_server("content_missing_from_cache_is_not_cached") else {
            return;
        };
        // Nothing registered: the remote must not be contacted.
        let fx = Fixture::new();
        fx.write("file.txt", FOX);
        fx.write_pointer("file.txt", FOX_MD5, 44);
        let remote = http_remote(&server);
        let ctx = fx.remote_context(true, remote.clone());

        let counts = push(&ctx, remote.as_ref(), vec![fx.path("file.txt")]);

        assert_eq!(counts.not_cached, 1);
        assert_eq!(counts.summary_line(), "Total files: 1, Not cached: 1");
        assert_eq!(
            fx.stderr(),
            vec![format!(
                "File for {} ({FOX_MD5}) not found in the cache.",
                fx.path("file.txt").display()
            )]
        );
    }

    #[test]
    fn rejected_upload_fails_only_that_file() {
        let Some(server) = start_server("rejected_upload_fails_only_that_file") else {
            return;
        };
        server.expect(
            Expectation::matching(request::method("HEAD"))
                .times(2)
                .respond_with(status_code(404)),
        );
        server.expect(
            Expectation::matching(request::method_path("PUT", FOX_PATH))
                .respond_with(status_code(401)),
        );
        server.expect(
            Expectation::matching(request::method_path("PUT", OTHER_PATH))
                .respond_with(status_code(200)),
        );
        let fx = Fixture::new();
        fx.write_pointer("a.txt", FOX_MD5, 44);
        fx.write_cached(FOX_MD5, FOX);
        fx.write_pointer("b.txt", OTHER_MD5, 11);
        fx.write_cached(OTHER_MD5, "Cached file");
        fx.write("c.txt", "loose");
        let remote = http_remote(&server);
        let ctx = fx.remote_context(true, remote.clone());

        let counts = push(
            &ctx,
            remote.as_ref(),
            vec![fx.path("a.txt"), fx.path("b.txt"), fx.path("c.txt")],
        );

        assert_eq!(
            counts.summary_line(),
            "Total files: 3, Pushed: 1, Untracked: 1, Failed: 1"
        );
        assert!(counts.has_failures());
        let stderr = fx.stderr();
        assert!(stderr.contains(&format!(
            "Failed to push {}: Unauthorized",
            fx.path("a.txt").display()
        )));
        assert!(stderr.contains(&format!(
            "File {} is not tracked.",
            fx.path("c.txt").display()
        )));
    }

    #[test]
    fn without_cache_every_tracked_file_fails() {
        let Some(server) = start_server("without_cache_every_tracked_file_fails") else {
            return;
        };
        let fx = Fixture::new();
        fx.write_pointer("file.txt", FOX_MD5, 44);
        let remote = http_remote(&server);
        let ctx = fx.remote_context(false, remote.clone());

        let counts = push(&ctx, remote.as_ref(), vec![fx.path("file.txt")]);

        assert_eq!(counts.failed, 1);
        assert_eq!(
            fx.stderr(),
            vec!["No DVC cache to take the file content from.".to_string()]
        );
    }
}
