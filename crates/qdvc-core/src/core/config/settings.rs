use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub(crate) const JOBS_ENV: &str = "QDVC_JOBS";
pub(crate) const CACHE_DIR_ENV: &str = "QDVC_CACHE_DIR";
pub(crate) const REMOTE_URL_ENV: &str = "QDVC_REMOTE_URL";
pub(crate) const HTTP_TIMEOUT_ENV: &str = "QDVC_HTTP_TIMEOUT";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
    pub json: bool,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    #[must_use]
    pub fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

/// Settings read from the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) jobs: Option<usize>,
    pub(crate) cache_dir_override: Option<PathBuf>,
    pub(crate) remote_url_override: Option<String>,
    pub(crate) http_timeout: Duration,
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> Self {
        Self {
            jobs: snapshot
                .var(JOBS_ENV)
                .and_then(|value| value.trim().parse::<usize>().ok()),
            cache_dir_override: snapshot.var(CACHE_DIR_ENV).map(PathBuf::from),
            remote_url_override: snapshot.var(REMOTE_URL_ENV).map(ToOwned::to_owned),
            http_timeout: snapshot
                .var(HTTP_TIMEOUT_ENV)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map_or(DEFAULT_HTTP_TIMEOUT, Duration::from_secs),
        }
    }

    #[must_use]
    pub fn jobs(&self) -> Option<usize> {
        self.jobs
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jobs: None,
            cache_dir_override: None,
            remote_url_override: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_snapshot(&EnvSnapshot::testing(&[]));
        assert_eq!(config.jobs(), None);
        assert_eq!(config.http_timeout(), Duration::from_secs(600));
        assert!(config.cache_dir_override.is_none());
        assert!(config.remote_url_override.is_none());
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let config = Config::from_snapshot(&EnvSnapshot::testing(&[
            (JOBS_ENV, "12"),
            (CACHE_DIR_ENV, "/srv/cache"),
            (REMOTE_URL_ENV, "https://store.example/repo"),
            (HTTP_TIMEOUT_ENV, "soon"),
        ]));
        assert_eq!(config.jobs(), Some(12));
        assert_eq!(config.cache_dir_override, Some(PathBuf::from("/srv/cache")));
        assert_eq!(
            config.remote_url_override.as_deref(),
            Some("https://store.example/repo")
        );
        assert_eq!(config.http_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn empty_values_count_as_unset() {
        let snapshot = EnvSnapshot::testing(&[(CACHE_DIR_ENV, "")]);
        assert_eq!(snapshot.var(CACHE_DIR_ENV), None);
    }
}
