//! Trust document verification.
//!
//! Each step is a hard gate and they run in a fixed order:
//! envelope, payload, URL authorization, root key, signature. A correctly
//! signed document served from a location its signer never listed is
//! refused at the URL gate.

use std::sync::Arc;

use trustdoc_crypto::{normalize_line_endings, PublicKey, SignedEnvelope};
use trustdoc_keys::RootKeyChain;

use crate::error::{DocumentError, DocumentResult};
use crate::payload::TrustPayload;

/// Output of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayload {
    pub resolved_url: String,
    pub payload: TrustPayload,
    pub root_key: PublicKey,
}

/// Stateless verifier for raw envelope bytes.
#[derive(Default)]
pub struct TrustDocumentVerifier {
    pinned_roots: Option<Arc<RootKeyChain>>,
}

impl TrustDocumentVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Additionally require the document's `_ROOT` key to be a key of `chain`.
    pub fn with_pinned_roots(chain: Arc<RootKeyChain>) -> Self {
        Self {
            pinned_roots: Some(chain),
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned_roots.is_some()
    }

    /// Verify `raw` as fetched from `resolved_url`.
    pub fn verify(&self, raw: &[u8], resolved_url: &str) -> DocumentResult<VerifiedPayload> {
        let text = std::str::from_utf8(raw).map_err(|_| {
            tracing::warn!(url = %resolved_url, "Document is not valid UTF-8");
            DocumentError::MalformedEnvelope("document is not valid UTF-8".to_string())
        })?;
        let text = normalize_line_endings(text);

        let envelope = SignedEnvelope::parse(&text).map_err(|e| {
            tracing::warn!(url = %resolved_url, error = %e, "Envelope rejected");
            DocumentError::MalformedEnvelope(e.to_string())
        })?;

        let payload: TrustPayload = serde_json::from_str(envelope.body()).map_err(|e| {
            tracing::warn!(url = %resolved_url, error = %e, "Payload rejected");
            DocumentError::MalformedPayload(e.to_string())
        })?;

        if !payload.allows_url(resolved_url) {
            tracing::error!(url = %resolved_url, listed = payload.urls.len(), "Url not listed in document");
            return Err(DocumentError::UrlNotAuthorized(resolved_url.to_string()));
        }

        let entry = payload.root_key_entry().ok_or_else(|| {
            tracing::warn!(url = %resolved_url, "Document has no _ROOT key");
            DocumentError::RootKeyMissing
        })?;
        let root_key = PublicKey::from_text(&entry.key).map_err(|e| {
            tracing::warn!(url = %resolved_url, error = %e, "Root key rejected");
            DocumentError::MalformedKey(e.to_string())
        })?;

        if let Some(chain) = &self.pinned_roots {
            if !chain.contains_public_key(&root_key) {
                let key_id = root_key.key_id();
                tracing::error!(url = %resolved_url, key_id = %key_id, "Root key not pinned");
                return Err(DocumentError::UntrustedRootKey { key_id });
            }
        }

        if !envelope.verify_with(&root_key) {
            tracing::error!(url = %resolved_url, key_id = %root_key.key_id(), "Signature not valid");
            return Err(DocumentError::SignatureInvalid(resolved_url.to_string()));
        }

        tracing::info!(url = %resolved_url, key_id = %root_key.key_id(), "Trust document verified");
        Ok(VerifiedPayload {
            resolved_url: resolved_url.to_string(),
            payload,
            root_key,
        })
    }
}

impl std::fmt::Debug for TrustDocumentVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustDocumentVerifier")
            .field("pinned_roots", &self.pinned_roots.as_ref().map(|c| c.len()))
            .finish()
    }
}
