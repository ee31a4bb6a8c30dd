#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate
)]

mod core;

pub(crate) use crate::core::runtime::{effects, workers};
pub(crate) use crate::core::{config, store, sync, tooling};

pub use crate::core::config::{
    CommandContext, Config, CredentialSource, Credentials, EnvSnapshot, GlobalOptions, RepoConfig,
};
pub use crate::core::runtime::effects::{
    BufferedConsole, Console, Effects, FileSystem, SharedEffects, SystemEffects,
};
pub use crate::core::runtime::{execute, to_json_response, SyncCommand};
pub use crate::core::store::{
    resolve_cache_location, CacheLocation, CacheStore, HttpRemote, RemoteError, RemoteStore,
};
pub use crate::core::sync::{
    add, clean, pull, push, resolve, status, status_remote, AddCounts, CleanCounts, PullCounts,
    PushCounts, ResolveError, RunSummary, StatusCounts, StatusRemoteCounts,
};
pub use crate::core::tooling::outcome::{CommandStatus, ExecutionOutcome, UserErrorReason};

pub const QDVC_VERSION: &str = env!("CARGO_PKG_VERSION");
