//! One fetch-and-verify attempt for a trust document.

use std::fmt;

use crate::error::{DocumentError, DocumentResult};
use crate::fetch::{DocumentSource, TrustDocumentFetcher};
use crate::payload::TrustPayload;
use crate::verify::{TrustDocumentVerifier, VerifiedPayload};

/// Trust document lifecycle: `new` → `load` → `validate`.
///
/// The payload is only reachable once validation has succeeded. A verified
/// document is never mutated; to refresh, build a new one.
#[derive(Debug, Clone)]
pub struct TrustDocument {
    candidate_urls: Vec<String>,
    resolved_url: Option<String>,
    raw_envelope: Option<Vec<u8>>,
    verified: Option<VerifiedPayload>,
}

impl TrustDocument {
    pub fn new<I, S>(urls: I) -> DocumentResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidate_urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        if candidate_urls.is_empty() {
            return Err(DocumentError::InvalidInput(
                "at least one url must be provided".to_string(),
            ));
        }
        Ok(Self {
            candidate_urls,
            resolved_url: None,
            raw_envelope: None,
            verified: None,
        })
    }

    /// Fetch the raw envelope from the first reachable candidate URL.
    pub fn load<S: DocumentSource>(&mut self, fetcher: &TrustDocumentFetcher<S>) -> DocumentResult<()> {
        if self.verified.is_some() {
            return Err(DocumentError::InvalidInput(
                "document is already verified".to_string(),
            ));
        }
        let fetched = fetcher.fetch(&self.candidate_urls)?;
        self.resolved_url = Some(fetched.resolved_url);
        self.raw_envelope = Some(fetched.bytes);
        Ok(())
    }

    /// Run the verifier over the loaded envelope.
    ///
    /// On failure the raw envelope is discarded so it cannot be validated
    /// again or reused.
    pub fn validate(&mut self, verifier: &TrustDocumentVerifier) -> DocumentResult<&TrustPayload> {
        if self.verified.is_some() {
            return Err(DocumentError::InvalidInput(
                "document is already verified".to_string(),
            ));
        }
        let (raw, url) = match (&self.raw_envelope, &self.resolved_url) {
            (Some(raw), Some(url)) => (raw, url),
            _ => {
                return Err(DocumentError::InvalidInput(
                    "document must be loaded before validation".to_string(),
                ))
            }
        };

        match verifier.verify(raw, url) {
            Ok(verified) => {
                let verified = self.verified.insert(verified);
                Ok(&verified.payload)
            }
            Err(e) => {
                self.raw_envelope = None;
                Err(e)
            }
        }
    }

    pub fn is_verified(&self) -> bool {
        self.verified.is_some()
    }

    pub fn payload(&self) -> Option<&TrustPayload> {
        self.verified.as_ref().map(|v| &v.payload)
    }

    pub fn verified(&self) -> Option<&VerifiedPayload> {
        self.verified.as_ref()
    }

    pub fn candidate_urls(&self) -> &[String] {
        &self.candidate_urls
    }

    pub fn resolved_url(&self) -> Option<&str> {
        self.resolved_url.as_deref()
    }
}

impl fmt::Display for TrustDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrustDocument(urls=[{}], verified={})",
            self.candidate_urls.join(", "),
            self.is_verified()
        )
    }
}
