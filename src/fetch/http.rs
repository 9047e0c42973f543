//! HTTP fetcher.
//!
//! Downloads are streamed straight to disk; release archives for tools
//! like etcd or kube-apiserver run to tens of megabytes.

use super::Fetcher;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Upper bound on a single download.
pub const MAX_DOWNLOAD_SIZE: u64 = 512 * 1024 * 1024;

const USER_AGENT: &str = concat!("testbin/", env!("CARGO_PKG_VERSION"));

/// Fetcher backed by a blocking `ureq` agent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    limit: u64,
}

impl HttpFetcher {
    /// Create a fetcher with default agent settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_agent(ureq::Agent::new_with_defaults())
    }

    /// Create a fetcher using a preconfigured agent (proxies, timeouts).
    #[must_use]
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self {
            agent,
            limit: MAX_DOWNLOAD_SIZE,
        }
    }

    /// Override the download size limit.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn map_ureq_error(url: &str, err: ureq::Error) -> Error {
    match err {
        ureq::Error::StatusCode(status) => Error::HttpStatus {
            url: url.to_string(),
            status,
        },
        other => Error::Http {
            url: url.to_string(),
            message: other.to_string(),
        },
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        log::debug!("GET {url}");

        let mut response = self
            .agent
            .get(url)
            .header("Accept", "application/octet-stream")
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| map_ureq_error(url, e))?;

        let mut reader = response.body_mut().with_config().limit(self.limit).reader();
        let mut file = File::create(dest).map_err(|e| Error::io(dest, e))?;

        // Body read errors are transport failures; write errors belong to dest.
        let mut buf = vec![0u8; 64 * 1024];
        let mut written = 0u64;
        loop {
            let n = reader.read(&mut buf).map_err(|e| Error::Http {
                url: url.to_string(),
                message: e.to_string(),
            })?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).map_err(|e| Error::io(dest, e))?;
            written += n as u64;
        }
        file.flush().map_err(|e| Error::io(dest, e))?;

        log::debug!("downloaded {written} bytes from {url}");
        Ok(written)
    }
}
