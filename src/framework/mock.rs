//! # Mock Collaborators
//!
//! Utilities for testing templates without touching the network.
//!
//! [`MockFetcher`] stands in for the remote [`ScriptFetcher`]. Register what each URL should
//! return with [`MockFetcher::expect_fetch`], hand a clone to the template, and call
//! [`MockFetcher::verify`] at the end to assert every expectation was used and nothing
//! unexpected was requested.
//!
//! # Example
//! ```ignore
//! let mut fetcher = MockFetcher::new();
//! fetcher.expect_fetch("https://cdn.example.com/lib.js").return_ok("lib();");
//! fetcher.expect_fetch("https://cdn.example.com/slow.js")
//!     .after(Duration::from_millis(50))
//!     .return_err("timed out");
//!
//! let loaders = ScriptLoaders::new(Arc::new(FsReader), Arc::new(fetcher.clone()));
//! // Build the template with `loaders`...
//! fetcher.verify();
//! ```

use crate::clients::{LoadError, ScriptFetcher};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Canned reply for one expected fetch.
struct Expectation {
    response: Result<String, String>,
    delay: Option<Duration>,
}

/// A remote fetcher with expectation tracking.
///
/// Fetches run concurrently, so expectations are matched per URL rather than in call
/// order. Several expectations for the same URL are consumed first-in, first-out.
#[derive(Clone, Default)]
pub struct MockFetcher {
    expectations: Arc<Mutex<HashMap<String, VecDeque<Expectation>>>>,
    unexpected: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    /// Creates a fetcher with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects one fetch of `url`.
    pub fn expect_fetch(&mut self, url: impl Into<String>) -> FetchExpectationBuilder {
        FetchExpectationBuilder {
            url: url.into(),
            delay: None,
            expectations: self.expectations.clone(),
        }
    }

    /// URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Verifies that all expectations were met and no unexpected URL was fetched.
    pub fn verify(&self) {
        let unexpected = self.unexpected.lock().unwrap();
        if !unexpected.is_empty() {
            panic!("Unexpected fetches: {:?}", *unexpected);
        }
        let exps = self.expectations.lock().unwrap();
        let remaining: usize = exps.values().map(VecDeque::len).sum();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

#[async_trait]
impl ScriptFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, LoadError> {
        self.calls.lock().unwrap().push(url.to_string());

        let expectation = self
            .expectations
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front);

        let Some(expectation) = expectation else {
            self.unexpected.lock().unwrap().push(url.to_string());
            return Err(LoadError::Unavailable(format!("no expectation for {url}")));
        };

        if let Some(delay) = expectation.delay {
            tokio::time::sleep(delay).await;
        }
        expectation.response.map_err(LoadError::Unavailable)
    }
}

/// Builder for `fetch` expectations.
pub struct FetchExpectationBuilder {
    url: String,
    delay: Option<Duration>,
    expectations: Arc<Mutex<HashMap<String, VecDeque<Expectation>>>>,
}

impl FetchExpectationBuilder {
    /// Holds the reply back for `delay` before answering.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sets the expectation to return the script body.
    pub fn return_ok(self, body: impl Into<String>) {
        self.push(Ok(body.into()));
    }

    /// Sets the expectation to fail with the given message.
    pub fn return_err(self, message: impl Into<String>) {
        self.push(Err(message.into()));
    }

    fn push(self, response: Result<String, String>) {
        let mut exps = self.expectations.lock().unwrap();
        exps.entry(self.url).or_default().push_back(Expectation {
            response,
            delay: self.delay,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetcher_returns_expectations_per_url() {
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch("http://a/1.js").return_ok("one");
        fetcher.expect_fetch("http://a/2.js").return_err("boom");

        assert_eq!(fetcher.fetch("http://a/2.js").await.unwrap_err().to_string(), "script unavailable: boom");
        assert_eq!(fetcher.fetch("http://a/1.js").await.unwrap(), "one");
        assert_eq!(fetcher.calls(), vec!["http://a/2.js".to_string(), "http://a/1.js".into()]);
        fetcher.verify();
    }

    #[tokio::test]
    #[should_panic(expected = "Unexpected fetches")]
    async fn test_verify_rejects_unexpected_fetch() {
        let fetcher = MockFetcher::new();
        let _ = fetcher.fetch("http://a/other.js").await;
        fetcher.verify();
    }

    #[test]
    #[should_panic(expected = "Not all expectations were met")]
    fn test_verify_rejects_unused_expectation() {
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch("http://a/1.js").return_ok("one");
        fetcher.verify();
    }
}
