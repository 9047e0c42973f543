//! Artifact download.
//!
//! This module provides the [`Fetcher`] trait and two implementations:
//! [`http::HttpFetcher`] for real downloads and [`MockFetcher`] for tests.
//!
//! # Testing
//!
//! Use [`MockFetcher`] to serve artifacts without network access:
//!
//! ```
//! use testbin::fetch::{Fetcher, MockFetcher};
//!
//! let mock = MockFetcher::new();
//! mock.add_body("https://example.com/foo", b"payload".to_vec());
//!
//! let dir = tempfile::tempdir().unwrap();
//! let dest = dir.path().join("foo-archive");
//! assert_eq!(mock.fetch("https://example.com/foo", &dest).unwrap(), 7);
//! assert_eq!(mock.requests(), vec!["https://example.com/foo".to_string()]);
//! ```

pub mod http;

pub use http::HttpFetcher;

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// Downloads a URL into a file.
///
/// Implementations are shared across worker threads.
pub trait Fetcher: Send + Sync {
    /// Download `url` into `dest`, creating or truncating it.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HttpStatus`] for non-success responses,
    /// [`Error::Http`] for transport failures and [`Error::Io`] if `dest`
    /// cannot be written.
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;
}

impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        (**self).fetch(url, dest)
    }
}

#[derive(Debug, Clone)]
enum MockResponse {
    Body(Vec<u8>),
    Status(u16),
}

/// Fetcher that serves in-memory responses.
///
/// Unknown URLs answer 404. Every request is recorded, including failed
/// ones. Clones share their responses and request log.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    /// Create a mock with no responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn add_body(&self, url: impl Into<String>, body: Vec<u8>) {
        let mut responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        responses.insert(url.into(), MockResponse::Body(body));
    }

    /// Answer `url` with an HTTP status code.
    pub fn add_status(&self, url: impl Into<String>, status: u16) {
        let mut responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        responses.insert(url.into(), MockResponse::Status(status));
    }

    /// URLs requested so far, in request order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        let response = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
            .unwrap_or(MockResponse::Status(404));

        match response {
            MockResponse::Body(body) => {
                fs::write(dest, &body).map_err(|e| Error::io(dest, e))?;
                Ok(body.len() as u64)
            }
            MockResponse::Status(status) => Err(Error::HttpStatus {
                url: url.to_string(),
                status,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_serves_body() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        let mock = MockFetcher::new();
        mock.add_body("mock://a", vec![1, 2, 3]);

        assert_eq!(mock.fetch("mock://a", &dest).unwrap(), 3);
        assert_eq!(fs::read(&dest).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_mock_unknown_url_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockFetcher::new();
        match mock.fetch("mock://missing", &dir.path().join("out")) {
            Err(Error::HttpStatus { url, status }) => {
                assert_eq!(url, "mock://missing");
                assert_eq!(status, 404);
            }
            other => panic!("expected status error, got {other:?}"),
        }
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_mock_canned_status() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockFetcher::new();
        mock.add_status("mock://flaky", 503);
        let err = mock.fetch("mock://flaky", &dir.path().join("out")).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_mock_records_requests_across_clones() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockFetcher::new();
        mock.add_body("mock://a", vec![]);
        let shared = mock.clone();

        let _ = shared.fetch("mock://a", &dir.path().join("a"));
        let _ = shared.fetch("mock://b", &dir.path().join("b"));

        assert_eq!(mock.request_count(), 2);
        assert_eq!(mock.requests(), vec!["mock://a", "mock://b"]);
    }

    #[test]
    fn test_arc_fetcher_delegates() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockFetcher::new();
        mock.add_body("mock://a", b"xy".to_vec());
        let fetcher: Arc<dyn Fetcher> = Arc::new(mock.clone());
        assert_eq!(fetcher.fetch("mock://a", &dir.path().join("a")).unwrap(), 2);
        assert_eq!(mock.request_count(), 1);
    }
}
