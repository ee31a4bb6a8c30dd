//! Configuration, credentials, and per-command context assembly.

pub mod context;
pub mod credentials;
pub mod repo_config;
pub mod settings;

pub use context::CommandContext;
pub use credentials::{CredentialSource, Credentials};
pub use repo_config::{ConfigProperty, PropertySource, RepoConfig};
pub use settings::*;
