//! Reader for the repository's `.dvc/config` and `.dvc/config.local`.
//!
//! The files are INI-like: `[section]` headers followed by `key = value`
//! lines. Properties are addressed as `<section>.<key>`, where the section is
//! the header text with its brackets trimmed, so a remote named `origin` lives
//! under `'remote "origin"'.url`. Values from `config.local` override values
//! from `config`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::core::fs::absolutize;
use crate::effects::FileSystem;

pub const PROJECT_CONFIG_FILE: &str = "config";
pub const LOCAL_CONFIG_FILE: &str = "config.local";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertySource {
    Project,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigProperty {
    pub name: String,
    pub value: String,
    pub source: PropertySource,
}

#[derive(Debug, Clone, Default)]
pub struct RepoConfig {
    properties: HashMap<String, ConfigProperty>,
    project_file: Option<PathBuf>,
    local_file: Option<PathBuf>,
}

impl RepoConfig {
    /// Reads both config files from `dvc_dir`. Missing files are skipped.
    pub fn load(fs: &dyn FileSystem, dvc_dir: &Path) -> Result<Self> {
        let mut config = Self::default();

        let project = dvc_dir.join(PROJECT_CONFIG_FILE);
        if fs.is_file(&project) {
            let text = fs.read_to_string(&project)?;
            config.merge(&text, PropertySource::Project);
            config.project_file = Some(project);
        }

        let local = dvc_dir.join(LOCAL_CONFIG_FILE);
        if fs.is_file(&local) {
            let text = fs.read_to_string(&local)?;
            config.merge(&text, PropertySource::Local);
            config.local_file = Some(local);
        }

        debug!(
            dvc_dir = %dvc_dir.display(),
            properties = config.properties.len(),
            "loaded repository config"
        );
        Ok(config)
    }

    fn merge(&mut self, text: &str, source: PropertySource) {
        let mut section = String::new();
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }
            if trimmed.starts_with('[') {
                section = trimmed
                    .trim_start_matches('[')
                    .trim_end_matches(']')
                    .trim()
                    .to_string();
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                debug!(line = trimmed, "skipping config line without '='");
                continue;
            };
            let name = format!("{section}.{}", key.trim());
            self.properties.insert(
                name.clone(),
                ConfigProperty {
                    name,
                    value: value.trim().to_string(),
                    source,
                },
            );
        }
    }

    pub fn property(&self, name: &str) -> Option<&ConfigProperty> {
        self.properties.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.property(name).map(|prop| prop.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn project_file(&self) -> Option<&Path> {
        self.project_file.as_deref()
    }

    pub fn local_file(&self) -> Option<&Path> {
        self.local_file.as_deref()
    }

    /// Absolute `cache.dir`; relative values resolve against the config file's directory.
    pub fn cache_dir(&self) -> Option<PathBuf> {
        let value = self.value("cache.dir")?;
        let path = Path::new(value);
        if path.is_absolute() {
            return Some(path.to_path_buf());
        }
        let base = self
            .project_file
            .as_deref()
            .or(self.local_file.as_deref())?
            .parent()?;
        Some(absolutize(base, path))
    }

    /// Name of the default remote (`core.remote`).
    pub fn default_remote(&self) -> Option<&str> {
        self.value("core.remote")
    }

    /// Looks up `key` in the default remote's section.
    pub fn remote_value(&self, key: &str) -> Option<&str> {
        let remote = self.default_remote()?;
        self.value(&format!("'remote \"{remote}\"'.{key}"))
            .or_else(|| self.value(&format!("remote \"{remote}\".{key}")))
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_value("url")
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::effects::SystemFileSystem;

    const PROJECT: &str = "[core]\n    remote = MyRepo-artifactory\n['remote \"MyRepo-artifactory\"']\n    url = https://artifactory.example/artifactory/MyRepo\n    auth = basic\n    method = PUT\n    jobs = 4\n[cache]\n    dir = /global/dvc/cache/MyRepo\n";
    const LOCAL: &str = "['remote \"MyRepo-artifactory\"']\n    user = andrew\n    password = asdfgh\n[cache]\n    dir = ../../local/MyRepo\n";

    fn dvc_dir_with(project: Option<&str>, local: Option<&str>) -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dvc = tmp.path().join("work").join("MyRepo").join(".dvc");
        fs::create_dir_all(&dvc).expect("dvc dir");
        if let Some(text) = project {
            fs::write(dvc.join(PROJECT_CONFIG_FILE), text).expect("config");
        }
        if let Some(text) = local {
            fs::write(dvc.join(LOCAL_CONFIG_FILE), text).expect("config.local");
        }
        (tmp, dvc)
    }

    #[test]
    fn reads_both_files_with_local_overrides() {
        let (_tmp, dvc) = dvc_dir_with(Some(PROJECT), Some(LOCAL));
        let config = RepoConfig::load(&SystemFileSystem, &dvc).expect("load");

        assert_eq!(config.project_file(), Some(dvc.join("config").as_path()));
        assert_eq!(config.local_file(), Some(dvc.join("config.local").as_path()));
        assert_eq!(config.len(), 8);

        let remote = config.property("core.remote").expect("core.remote");
        assert_eq!(remote.value, "MyRepo-artifactory");
        assert_eq!(remote.source, PropertySource::Project);

        let user = config
            .property("'remote \"MyRepo-artifactory\"'.user")
            .expect("user");
        assert_eq!(user.value, "andrew");
        assert_eq!(user.source, PropertySource::Local);

        let cache = config.property("cache.dir").expect("cache.dir");
        assert_eq!(cache.value, "../../local/MyRepo");
        assert_eq!(cache.source, PropertySource::Local);
    }

    #[test]
    fn skips_lines_without_assignment() {
        let (_tmp, dvc) = dvc_dir_with(
            Some("[invalid]\n    line\n[core]\n    remote = MyRepo-artifactory\n"),
            None,
        );
        let config = RepoConfig::load(&SystemFileSystem, &dvc).expect("load");
        assert!(config.property("invalid.line").is_none());
        assert_eq!(config.default_remote(), Some("MyRepo-artifactory"));
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn missing_folder_yields_empty_config() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config =
            RepoConfig::load(&SystemFileSystem, &tmp.path().join("absent")).expect("load");
        assert!(config.is_empty());
        assert!(config.project_file().is_none());
        assert!(config.cache_dir().is_none());
    }

    #[test]
    fn cache_dir_resolves_relative_to_config_folder() {
        let (tmp, dvc) = dvc_dir_with(Some(PROJECT), Some(LOCAL));
        let config = RepoConfig::load(&SystemFileSystem, &dvc).expect("load");
        assert_eq!(
            config.cache_dir(),
            Some(tmp.path().join("work").join("local").join("MyRepo"))
        );
    }

    #[test]
    fn cache_dir_uses_local_file_when_project_file_is_missing() {
        let (tmp, dvc) = dvc_dir_with(None, Some("[cache]\n    dir = ../cache\n"));
        let config = RepoConfig::load(&SystemFileSystem, &dvc).expect("load");
        assert_eq!(
            config.cache_dir(),
            Some(tmp.path().join("work").join("MyRepo").join("cache"))
        );
    }

    #[test]
    fn cache_dir_keeps_absolute_values_and_is_absent_without_key() {
        let (_tmp, dvc) = dvc_dir_with(Some(PROJECT), None);
        let config = RepoConfig::load(&SystemFileSystem, &dvc).expect("load");
        assert_eq!(
            config.cache_dir(),
            Some(PathBuf::from("/global/dvc/cache/MyRepo"))
        );

        let (_tmp, dvc) = dvc_dir_with(Some("[core]\n    remote = x\n"), None);
        let config = RepoConfig::load(&SystemFileSystem, &dvc).expect("load");
        assert!(config.cache_dir().is_none());
    }

    #[test]
    fn remote_values_follow_core_remote() {
        let (_tmp, dvc) = dvc_dir_with(Some(PROJECT), Some(LOCAL));
        let config = RepoConfig::load(&SystemFileSystem, &dvc).expect("load");
        assert_eq!(
            config.remote_url(),
            Some("https://artifactory.example/artifactory/MyRepo")
        );
        assert_eq!(config.remote_value("password"), Some("asdfgh"));

        let (_tmp, dvc) = dvc_dir_with(
            Some("[core]\nremote = origin\n[remote \"origin\"]\nurl = https://plain.example\n"),
            None,
        );
        let config = RepoConfig::load(&SystemFileSystem, &dvc).expect("load");
        assert_eq!(config.remote_url(), Some("https://plain.example"));
    }
}
