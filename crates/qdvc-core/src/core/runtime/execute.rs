use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use qdvc_domain::find_dvc_dir;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::{CommandContext, Credentials, EnvSnapshot, GlobalOptions, RepoConfig};
use crate::core::fs::absolutize;
use crate::effects::SharedEffects;
use crate::store::{resolve_cache_location, CacheStore, HttpRemote, RemoteStore};
use crate::sync::{self, RunSummary};
use crate::tooling::outcome::{CommandStatus, ExecutionOutcome, UserErrorReason};

/// A parsed command line, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCommand {
    Add { paths: Vec<PathBuf> },
    Pull { paths: Vec<PathBuf> },
    Push { paths: Vec<PathBuf> },
    Status { paths: Vec<PathBuf>, remote: bool },
    Clean { paths: Vec<PathBuf>, force: bool },
}

impl SyncCommand {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SyncCommand::Add { .. } => "add",
            SyncCommand::Pull { .. } => "pull",
            SyncCommand::Push { .. } => "push",
            SyncCommand::Status { remote: false, .. } => "status",
            SyncCommand::Status { remote: true, .. } => "status-remote",
            SyncCommand::Clean { .. } => "clean",
        }
    }

    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            SyncCommand::Add { paths }
            | SyncCommand::Pull { paths }
            | SyncCommand::Push { paths }
            | SyncCommand::Status { paths, .. }
            | SyncCommand::Clean { paths, .. } => paths,
        }
    }

    /// Pull, push and `status --repo` talk to the remote store.
    #[must_use]
    pub fn needs_remote(&self) -> bool {
        matches!(
            self,
            SyncCommand::Pull { .. }
                | SyncCommand::Push { .. }
                | SyncCommand::Status { remote: true, .. }
        )
    }
}

/// Runs `command` against the repository around the current directory.
///
/// # Errors
///
/// Returns an error for unexpected setup failures (unreadable configuration,
/// a cache folder that cannot be created, a malformed remote URL). Problems the
/// user can fix are reported as [`CommandStatus::UserError`] outcomes instead.
pub fn execute(
    global: &GlobalOptions,
    command: &SyncCommand,
    effects: SharedEffects,
) -> Result<ExecutionOutcome> {
    let cwd = std::env::current_dir().context("failed to read the current directory")?;
    execute_in(global, command, effects, EnvSnapshot::capture(), &cwd)
}

pub(crate) fn execute_in(
    global: &GlobalOptions,
    command: &SyncCommand,
    effects: SharedEffects,
    env: EnvSnapshot,
    cwd: &Path,
) -> Result<ExecutionOutcome> {
    if command.paths().is_empty() {
        return Ok(user_error(UserErrorReason::NoPaths, "No paths given."));
    }
    let inputs: Vec<PathBuf> = command
        .paths()
        .iter()
        .map(|path| absolutize(cwd, path))
        .collect();

    let Some(dvc_dir) = find_dvc_dir(cwd).or_else(|| find_dvc_dir(&inputs[0])) else {
        return Ok(user_error(
            UserErrorReason::NoRepository,
            "Failed to find the .dvc folder.",
        ));
    };
    debug!(dvc_dir = %dvc_dir.display(), command = command.name(), "repository found");

    let ctx = CommandContext::from_env(global, env, effects);
    let repo_config = RepoConfig::load(ctx.fs(), &dvc_dir)?;

    let remote = if command.needs_remote() {
        let Some(credentials) = Credentials::detect(global, Some(&repo_config), ctx.env()) else {
            return Ok(user_error(
                UserErrorReason::NoCredentials,
                "Failed to detect credentials.",
            ));
        };
        ctx.console().out(&format!(
            "Credentials loaded from {}",
            credentials.source.label()
        ));
        let url = ctx
            .config()
            .remote_url_override
            .clone()
            .or_else(|| repo_config.remote_url().map(str::to_string));
        let Some(url) = url else {
            return Ok(user_error(
                UserErrorReason::NoRemote,
                "No remote URL configured.",
            ));
        };
        let remote = HttpRemote::new(&url, Some(credentials), ctx.config().http_timeout())?;
        Some(Arc::new(remote) as Arc<dyn RemoteStore>)
    } else {
        None
    };

    let mut candidates = Vec::new();
    for input in &inputs {
        match sync::resolve(ctx.fs(), input) {
            Ok(found) => candidates.extend(found),
            Err(err) => return Ok(user_error(UserErrorReason::InvalidPath, err.to_string())),
        }
    }
    if candidates.is_empty() {
        return Ok(user_error(UserErrorReason::NoFiles, "No files found."));
    }
    info!(inputs = inputs.len(), candidates = candidates.len(), "resolved inputs");

    let location = resolve_cache_location(
        ctx.config(),
        Some(&repo_config),
        candidates.first().map(PathBuf::as_path),
        cwd,
    );
    let cache = match &location {
        Some(location) => {
            debug!(path = %location.path.display(), source = location.source, "cache location");
            Some(CacheStore::open(ctx.fs(), &location.path)?)
        }
        None => None,
    };
    ctx.console().out(&format!(
        "DVC cache folder: {}",
        location
            .as_ref()
            .map_or_else(|| "none".to_string(), |found| found.path.display().to_string())
    ));

    let ctx = ctx.with_cache(cache).with_remote(remote);
    match command {
        SyncCommand::Add { .. } => finish(command, &sync::add(&ctx, candidates)),
        SyncCommand::Pull { .. } => {
            let remote = ctx.remote().context("remote store missing")?;
            finish(command, &sync::pull(&ctx, remote, candidates))
        }
        SyncCommand::Push { .. } => {
            let remote = ctx.remote().context("remote store missing")?;
            finish(command, &sync::push(&ctx, remote, candidates))
        }
        SyncCommand::Status { remote: false, .. } => finish(command, &sync::status(&ctx, candidates)),
        SyncCommand::Status { remote: true, .. } => {
            let remote = ctx.remote().context("remote store missing")?;
            finish(command, &sync::status_remote(&ctx, remote, candidates))
        }
        SyncCommand::Clean { force, .. } => finish(command, &sync::clean(&ctx, candidates, *force)),
    }
}

fn finish<S: RunSummary>(command: &SyncCommand, counts: &S) -> Result<ExecutionOutcome> {
    let details = json!({
        "command": command.name(),
        "counts": serde_json::to_value(counts)?,
    });
    let message = counts.summary_line();
    Ok(if counts.has_failures() {
        ExecutionOutcome::failure(message, details)
    } else {
        ExecutionOutcome::success(message, details)
    })
}

fn user_error(reason: UserErrorReason, message: impl Into<String>) -> ExecutionOutcome {
    ExecutionOutcome::user_error(reason, message, json!({ "reason": reason }))
}

/// The `--json` envelope for an outcome.
#[must_use]
pub fn to_json_response(outcome: &ExecutionOutcome) -> Value {
    let status = match outcome.status {
        CommandStatus::Ok => "ok",
        CommandStatus::Failure => "failure",
        CommandStatus::UserError(_) => "user-error",
    };
    let mut details = match &outcome.details {
        Value::Object(_) => outcome.details.clone(),
        Value::Null => json!({}),
        other => json!({ "value": other }),
    };
    details["exit_code"] = json!(outcome.exit_code());
    json!({
        "status": status,
        "message": outcome.message,
        "details": details,
    })
}
