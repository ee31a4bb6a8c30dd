use std::io::{self, Read, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use qdvc_domain::{ContentHash, HASH_ALGORITHM};
use reqwest::blocking::{Body, Client, RequestBuilder};
use reqwest::{Method, StatusCode};
use tracing::debug;
use url::Url;

use super::cache::FILES_DIR;
use crate::config::Credentials;

pub(crate) const USER_AGENT: &str = concat!("qdvc/", env!("CARGO_PKG_VERSION"));

/// Failure talking to the remote store.
///
/// Status failures display as the reason phrase without spaces (`NotFound`,
/// `Unauthorized`), which is what per-file diagnostics print.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("{reason}")]
    Status { code: u16, reason: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("i/o error: {0}")]
    Io(String),
}

impl RemoteError {
    pub(crate) fn from_status(status: StatusCode) -> Self {
        let reason = status.canonical_reason().map_or_else(
            || status.as_u16().to_string(),
            |reason| reason.replace([' ', '-'], ""),
        );
        RemoteError::Status {
            code: status.as_u16(),
            reason,
        }
    }
}

/// Blob store addressed by content hash.
pub trait RemoteStore: Send + Sync {
    /// Probes for `hash`; any non-success status means absent.
    fn exists(&self, hash: &ContentHash) -> Result<bool, RemoteError>;
    /// Streams the blob for `hash` into `sink`, returning the byte count.
    fn download(&self, hash: &ContentHash, sink: &mut dyn Write) -> Result<u64, RemoteError>;
    fn upload(
        &self,
        hash: &ContentHash,
        body: Box<dyn Read + Send>,
        size: u64,
    ) -> Result<(), RemoteError>;
}

/// HTTP remote laid out like the cache: `<url>/files/md5/<H0>/<H1>`.
pub struct HttpRemote {
    client: Client,
    base: String,
    credentials: Option<Credentials>,
}

impl HttpRemote {
    pub fn new(
        remote_url: &str,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Result<Self> {
        let parsed =
            Url::parse(remote_url).with_context(|| format!("invalid remote url {remote_url}"))?;
        let base = format!(
            "{}/{FILES_DIR}/{HASH_ALGORITHM}",
            parsed.as_str().trim_end_matches('/')
        );
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            base,
            credentials,
        })
    }

    pub fn object_url(&self, hash: &ContentHash) -> String {
        format!("{}/{}/{}", self.base, hash.shard(), hash.remainder())
    }

    fn request(&self, method: Method, hash: &ContentHash) -> RequestBuilder {
        let url = self.object_url(hash);
        debug!(%method, %url, "remote request");
        let builder = self.client.request(method, url);
        match &self.credentials {
            Some(creds) => builder.basic_auth(&creds.username, Some(&creds.password)),
            None => builder,
        }
    }
}

fn transport(err: &reqwest::Error) -> RemoteError {
    RemoteError::Transport(err.to_string())
}

impl RemoteStore for HttpRemote {
    fn exists(&self, hash: &ContentHash) -> Result<bool, RemoteError> {
        let response = self
            .request(Method::HEAD, hash)
            .send()
            .map_err(|err| transport(&err))?;
        let status = response.status();
        debug!(%hash, %status, "remote probe");
        Ok(status.is_success())
    }

    fn download(&self, hash: &ContentHash, sink: &mut dyn Write) -> Result<u64, RemoteError> {
        let mut response = self
            .request(Method::GET, hash)
            .send()
            .map_err(|err| transport(&err))?;
        let status = response.status();
        debug!(%hash, %status, "remote download");
        if !status.is_success() {
            return Err(RemoteError::from_status(status));
        }
        let written =
            io::copy(&mut response, sink).map_err(|err| RemoteError::Io(err.to_string()))?;
        sink.flush()
            .map_err(|err| RemoteError::Io(err.to_string()))?;
        Ok(written)
    }

    fn upload(
        &self,
        hash: &ContentHash,
        body: Box<dyn Read + Send>,
        size: u64,
    ) -> Result<(), RemoteError> {
        let response = self
            .request(Method::PUT, hash)
            .body(Body::sized(body, size))
            .send()
            .map_err(|err| transport(&err))?;
        let status = response.status();
        debug!(%hash, %status, "remote upload");
        if status.is_success() {
            Ok(())
        } else {
            Err(RemoteError::from_status(status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialSource;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use std::panic;

    const FOX: &str = "e4d909c290d0fb1ca068ffaddf22cbd0";
    const FOX_PATH: &str = "/repo/files/md5/e4/d909c290d0fb1ca068ffaddf22cbd0";

    fn fox() -> ContentHash {
        ContentHash::parse(FOX).expect("hash")
    }

    fn start_server(test: &str) -> Option<Server> {
        match panic::catch_unwind(Server::run) {
            Ok(server) => Some(server),
            Err(_) => {
                eprintln!("skipping {test} (httptest server unavailable)");
                None
            }
        }
    }

    fn remote(server: &Server, credentials: Option<Credentials>) -> HttpRemote {
        HttpRemote::new(
            &server.url_str("/repo/"),
            credentials,
            Duration::from_secs(5),
        )
        .expect("remote")
    }

    #[test]
    fn status_errors_render_reason_without_spaces() {
        assert_eq!(
            RemoteError::from_status(StatusCode::NOT_FOUND).to_string(),
            "NotFound"
        );
        assert_eq!(
            RemoteError::from_status(StatusCode::UNAUTHORIZED).to_string(),
            "Unauthorized"
        );
        assert_eq!(
            RemoteError::from_status(StatusCode::INTERNAL_SERVER_ERROR).to_string(),
            "InternalServerError"
        );
    }

    #[test]
    fn object_url_appends_cache_layout() {
        let remote = HttpRemote::new(
            "https://store.example/artifactory/MyRepo",
            None,
            Duration::from_secs(1),
        )
        .expect("remote");
        assert_eq!(
            remote.object_url(&fox()),
            "https://store.example/artifactory/MyRepo/files/md5/e4/d909c290d0fb1ca068ffaddf22cbd0"
        );
    }

    #[test]
    fn exists_maps_status_to_presence() {
        let Some(server) = start_server("exists_maps_status_to_presence") else {
            return;
        };
        server.expect(
            Expectation::matching(request::method_path("HEAD", FOX_PATH))
                .times(2)
                .respond_with(cycle![status_code(200), status_code(404)]),
        );
        let remote = remote(&server, None);
        assert_eq!(remote.exists(&fox()), Ok(true));
        assert_eq!(remote.exists(&fox()), Ok(false));
    }

    #[test]
    fn download_streams_body_with_basic_auth() {
        let Some(server) = start_server("download_streams_body_with_basic_auth") else {
            return;
        };
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", FOX_PATH),
                request::headers(contains(("authorization", "Basic dXNlcjpwYXNz"))),
            ])
            .respond_with(status_code(200).body("Code is poetry")),
        );
        let creds = Credentials {
            username: "user".into(),
            password: "pass".into(),
            source: CredentialSource::CommandLine,
        };
        let remote = remote(&server, Some(creds));
        let mut sink = Vec::new();
        let written = remote.download(&fox(), &mut sink).expect("download");
        assert_eq!(written, 14);
        assert_eq!(sink, b"Code is poetry");
    }

    #[test]
    fn download_reports_unauthorized() {
        let Some(server) = start_server("download_reports_unauthorized") else {
            return;
        };
        server.expect(
            Expectation::matching(request::method_path("GET", FOX_PATH))
                .respond_with(status_code(401)),
        );
        let remote = remote(&server, None);
        let mut sink = Vec::new();
        let err = remote.download(&fox(), &mut sink).expect_err("unauthorized");
        assert_eq!(
            err,
            RemoteError::Status {
                code: 401,
                reason: "Unauthorized".into()
            }
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn upload_sends_body() {
        let Some(server) = start_server("upload_sends_body") else {
            return;
        };
        server.expect(
            Expectation::matching(all_of![
                request::method_path("PUT", FOX_PATH),
                request::body(matches("^The quick brown fox jumps")),
            ])
            .respond_with(status_code(201)),
        );
        let remote = remote(&server, None);
        let body: &'static [u8] = b"The quick brown fox jumps over the lazy dog.";
        remote
            .upload(&fox(), Box::new(body), body.len() as u64)
            .expect("upload");
    }

    #[test]
    fn upload_failure_surfaces_status() {
        let Some(server) = start_server("upload_failure_surfaces_status") else {
            return;
        };
        server.expect(
            Expectation::matching(request::method_path("PUT", FOX_PATH))
                .respond_with(status_code(403)),
        );
        let remote = remote(&server, None);
        let err = remote
            .upload(&fox(), Box::new(&b"x"[..]), 1)
            .expect_err("forbidden");
        assert_eq!(err.to_string(), "Forbidden");
    }
}
