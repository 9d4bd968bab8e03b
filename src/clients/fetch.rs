//! File-system and network capabilities used to load script content.

use crate::clients::LoadError;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Reads local script files.
#[async_trait]
pub trait ScriptReader: Send + Sync {
    async fn read(&self, path: &Path) -> Result<String, LoadError>;
}

/// Fetches remote scripts over HTTP(S).
#[async_trait]
pub trait ScriptFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, LoadError>;
}

/// Reads scripts straight from disk with `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

#[async_trait]
impl ScriptReader for FsReader {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn read(&self, path: &Path) -> Result<String, LoadError> {
        debug!("Reading local script");
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Issues `GET` requests with a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScriptFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, LoadError> {
        debug!("Fetching remote script");
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// The pair of loading capabilities a template needs.
#[derive(Clone)]
pub struct ScriptLoaders {
    pub reader: Arc<dyn ScriptReader>,
    pub fetcher: Arc<dyn ScriptFetcher>,
}

impl ScriptLoaders {
    pub fn new(reader: Arc<dyn ScriptReader>, fetcher: Arc<dyn ScriptFetcher>) -> Self {
        Self { reader, fetcher }
    }
}

impl Default for ScriptLoaders {
    fn default() -> Self {
        Self {
            reader: Arc::new(FsReader),
            fetcher: Arc::new(HttpFetcher::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fs_reader_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.js");
        std::fs::write(&path, "console.log(1);").unwrap();

        let content = FsReader.read(&path).await.unwrap();
        assert_eq!(content, "console.log(1);");
    }

    #[tokio::test]
    async fn test_fs_reader_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.js");

        let err = FsReader.read(&path).await.unwrap_err();
        assert!(matches!(err, LoadError::Io { path: p, .. } if p == path));
    }
}
