use std::fmt;

use serde::Serialize;

use super::repo_config::RepoConfig;
use super::settings::{EnvSnapshot, GlobalOptions};

pub(crate) const USERNAME_ENV: &str = "ARTIFACTORY_USERNAME";
pub(crate) const TOKEN_ENV: &str = "ARTIFACTORY_TOKEN";
pub(crate) const PASSWORD_ENV: &str = "ARTIFACTORY_PASSWORD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    CommandLine,
    Config,
    Environment,
}

impl CredentialSource {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            CredentialSource::CommandLine => "command line arguments",
            CredentialSource::Config => "config",
            CredentialSource::Environment => "environment variables",
        }
    }
}

/// Username/password pair for HTTP Basic authentication against the remote.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub source: CredentialSource,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

impl Credentials {
    /// First complete pair from the command line, the repository config, then the environment.
    pub fn detect(
        global: &GlobalOptions,
        config: Option<&RepoConfig>,
        env: &EnvSnapshot,
    ) -> Option<Self> {
        from_command_line(global)
            .or_else(|| config.and_then(from_repo_config))
            .or_else(|| from_environment(env))
    }
}

fn from_command_line(global: &GlobalOptions) -> Option<Credentials> {
    let username = global.username.as_ref()?;
    let password = global.password.as_ref()?;
    Some(Credentials {
        username: username.clone(),
        password: password.clone(),
        source: CredentialSource::CommandLine,
    })
}

fn from_repo_config(config: &RepoConfig) -> Option<Credentials> {
    let username = config.remote_value("user")?;
    let password = config.remote_value("password")?;
    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
        source: CredentialSource::Config,
    })
}

fn from_environment(env: &EnvSnapshot) -> Option<Credentials> {
    let username = env.var(USERNAME_ENV)?;
    let password = env.var(TOKEN_ENV).or_else(|| env.var(PASSWORD_ENV))?;
    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
        source: CredentialSource::Environment,
    })
}
