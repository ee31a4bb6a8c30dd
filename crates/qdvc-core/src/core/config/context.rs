use std::sync::Arc;

use crate::config::{Config, EnvSnapshot, GlobalOptions};
use crate::effects::{self, Effects, SharedEffects};
use crate::store::{CacheStore, RemoteStore};

/// Everything a sync command needs, assembled once per invocation.
pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    env: EnvSnapshot,
    config: Config,
    effects: SharedEffects,
    cache: Option<CacheStore>,
    remote: Option<Arc<dyn RemoteStore>>,
}

impl<'a> CommandContext<'a> {
    /// Creates a context from the current process environment.
    #[must_use]
    pub fn new(global: &'a GlobalOptions, effects: SharedEffects) -> Self {
        Self::from_env(global, EnvSnapshot::capture(), effects)
    }

    pub(crate) fn from_env(
        global: &'a GlobalOptions,
        env: EnvSnapshot,
        effects: SharedEffects,
    ) -> Self {
        let config = Config::from_snapshot(&env);
        Self {
            global,
            env,
            config,
            effects,
            cache: None,
            remote: None,
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Option<CacheStore>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_remote(mut self, remote: Option<Arc<dyn RemoteStore>>) -> Self {
        self.remote = remote;
        self
    }

    pub fn effects(&self) -> &dyn Effects {
        self.effects.as_ref()
    }

    pub fn fs(&self) -> &dyn effects::FileSystem {
        self.effects.fs()
    }

    pub fn console(&self) -> &dyn effects::Console {
        self.effects.console()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn env(&self) -> &EnvSnapshot {
        &self.env
    }

    /// The local cache, when one could be located.
    pub fn cache(&self) -> Option<&CacheStore> {
        self.cache.as_ref()
    }

    pub fn remote(&self) -> Option<&dyn RemoteStore> {
        self.remote.as_deref()
    }

    pub fn jobs(&self) -> Option<usize> {
        self.config.jobs()
    }
}
