//! Fallback-URL document fetching.
//!
//! The fetcher walks the candidate URLs in order and returns the body of the
//! first one that answers at the transport level. There is exactly one
//! attempt per URL, bounded by the configured timeout, with no retry and no
//! parallelism. Content is not inspected here; that is the verifier's job.

use std::time::Duration;

use thiserror::Error;
use trustdoc_core::FetchConfig;

use crate::error::{DocumentError, DocumentResult};

/// Transport-level failure for one URL.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("{0}")]
    Failed(String),
}

/// Narrow network collaborator: fetch the raw bytes behind one URL.
pub trait DocumentSource {
    fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, TransportError>;
}

impl<T: DocumentSource + ?Sized> DocumentSource for &T {
    fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        (**self).get(url, timeout)
    }
}

/// Blocking HTTP(S) source.
///
/// Any completed HTTP exchange is a transport success, whatever its status;
/// the body is handed on and the status only logged.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(config: &FetchConfig) -> DocumentResult<Self> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(config.user_agent.clone());
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| DocumentError::InvalidInput(format!("http client: {}", e)))?;
        Ok(Self { client })
    }
}

impl DocumentSource for HttpSource {
    fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(TransportError::UnsupportedScheme(url.to_string()));
        }

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = %status, "Mirror answered with non-success status");
        }

        let body = response.bytes().map_err(|e| classify(e, timeout))?;
        Ok(body.to_vec())
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else {
        TransportError::Failed(err.to_string())
    }
}

/// Local `file://` source, for operators testing a document on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl DocumentSource for FileSource {
    fn get(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let path = url
            .strip_prefix("file://")
            .ok_or_else(|| TransportError::UnsupportedScheme(url.to_string()))?;
        std::fs::read(path).map_err(|e| TransportError::Failed(format!("{}: {}", path, e)))
    }
}

/// Routes `file://` URLs to [`FileSource`] and everything else to [`HttpSource`].
#[derive(Debug, Clone)]
pub struct DefaultSource {
    http: HttpSource,
    file: FileSource,
}

impl DefaultSource {
    pub fn new(config: &FetchConfig) -> DocumentResult<Self> {
        Ok(Self {
            http: HttpSource::new(config)?,
            file: FileSource,
        })
    }
}

impl DocumentSource for DefaultSource {
    fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        if url.starts_with("file://") {
            self.file.get(url, timeout)
        } else {
            self.http.get(url, timeout)
        }
    }
}

/// Raw bytes plus the URL that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub bytes: Vec<u8>,
    pub resolved_url: String,
}

/// Fetches from the first reachable mirror.
#[derive(Debug, Clone)]
pub struct TrustDocumentFetcher<S> {
    source: S,
    timeout: Duration,
}

impl TrustDocumentFetcher<DefaultSource> {
    /// HTTP(S) and `file://` fetcher built from configuration.
    pub fn from_config(config: &FetchConfig) -> DocumentResult<Self> {
        Ok(Self::new(DefaultSource::new(config)?, config.timeout()))
    }
}

impl<S: DocumentSource> TrustDocumentFetcher<S> {
    pub fn new(source: S, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Return the body of the first URL that answers.
    ///
    /// An empty list is rejected before any network access. If every URL
    /// fails, the error carries the full list that was tried.
    pub fn fetch<U: AsRef<str>>(&self, urls: &[U]) -> DocumentResult<FetchedDocument> {
        if urls.is_empty() {
            return Err(DocumentError::InvalidInput(
                "at least one url must be provided".to_string(),
            ));
        }

        for url in urls {
            let url = url.as_ref();
            match self.source.get(url, self.timeout) {
                Ok(bytes) => {
                    tracing::info!(url = %url, bytes = bytes.len(), "Fetched trust document");
                    return Ok(FetchedDocument {
                        bytes,
                        resolved_url: url.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Mirror unreachable, trying next");
                }
            }
        }

        Err(DocumentError::NoReachableSource {
            urls: urls.iter().map(|u| u.as_ref().to_string()).collect(),
        })
    }
}
