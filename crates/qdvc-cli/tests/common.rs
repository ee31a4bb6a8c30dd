#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::assert::Assert;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub const FOX: &str = "The quick brown fox jumps over the lazy dog.";
pub const FOX_MD5: &str = "e4d909c290d0fb1ca068ffaddf22cbd0";
pub const FOX_REMOTE_PATH: &str = "/repo/files/md5/e4/d909c290d0fb1ca068ffaddf22cbd0";

const SCRUBBED_ENV: &[&str] = &[
    "QDVC_JOBS",
    "QDVC_CACHE_DIR",
    "QDVC_REMOTE_URL",
    "QDVC_HTTP_TIMEOUT",
    "ARTIFACTORY_USERNAME",
    "ARTIFACTORY_TOKEN",
    "ARTIFACTORY_PASSWORD",
];

/// A temporary DVC repository (a folder holding `.dvc`).
pub struct Repo {
    temp: TempDir,
}

impl Repo {
    pub fn new() -> Self {
        let temp = tempfile::Builder::new()
            .prefix("qdvc-cli")
            .tempdir()
            .expect("tempdir");
        fs::create_dir_all(temp.path().join(".dvc")).expect("dvc dir");
        Self { temp }
    }

    /// A folder without any `.dvc` marker.
    pub fn bare() -> Self {
        let temp = tempfile::Builder::new()
            .prefix("qdvc-bare")
            .tempdir()
            .expect("tempdir");
        Self { temp }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("dirs");
        fs::write(&path, content).expect("write");
        path
    }

    pub fn write_pointer(&self, relative: &str, hash: &str, size: usize) -> PathBuf {
        let name = Path::new(relative)
            .file_name()
            .expect("name")
            .to_string_lossy()
            .into_owned();
        self.write(
            &format!("{relative}.dvc"),
            &format!("outs:\n- md5: {hash}\n  size: {size}\n  hash: md5\n  path: {name}\n\n"),
        )
    }

    pub fn cached_path(&self, hash: &str) -> PathBuf {
        self.path(".dvc/cache/files/md5")
            .join(&hash[..2])
            .join(&hash[2..])
    }

    /// `qdvc` running inside the repository with a scrubbed environment.
    pub fn qdvc(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("qdvc");
        cmd.current_dir(self.root()).env("NO_COLOR", "1");
        for key in SCRUBBED_ENV {
            cmd.env_remove(key);
        }
        cmd
    }

    /// `qdvc` with environment credentials and `remote_url` as the remote.
    pub fn qdvc_remote(&self, remote_url: &str) -> Command {
        let mut cmd = self.qdvc();
        cmd.env("ARTIFACTORY_USERNAME", "user")
            .env("ARTIFACTORY_TOKEN", "token")
            .env("QDVC_REMOTE_URL", remote_url);
        cmd
    }
}

pub fn stdout_lines(assert: &Assert) -> Vec<String> {
    String::from_utf8_lossy(&assert.get_output().stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn stderr_lines(assert: &Assert) -> Vec<String> {
    String::from_utf8_lossy(&assert.get_output().stderr)
        .lines()
        .map(str::to_string)
        .collect()
}

/// Whether some line starts with `prefix` and ends with `file`.
pub fn has_line(lines: &[String], prefix: &str, file: &str) -> bool {
    lines
        .iter()
        .any(|line| line.starts_with(prefix) && line.ends_with(file))
}

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}

pub fn start_server(test: &str) -> Option<httptest::Server> {
    match std::panic::catch_unwind(httptest::Server::run) {
        Ok(server) => Some(server),
        Err(_) => {
            eprintln!("skipping {test} (httptest server unavailable)");
            None
        }
    }
}
