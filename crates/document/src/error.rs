//! Error types for trust document fetch and verification.

use thiserror::Error;
use trustdoc_keys::KeyringError;

/// Every fetch/verify failure is terminal for the attempt: the document
/// is untrusted and the envelope must not be reused.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Caller misuse (empty URL list, validating an unloaded document, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every candidate URL failed at the transport level
    #[error("Could not load any of the urls: {urls:?}")]
    NoReachableSource { urls: Vec<String> },

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The URL the bytes came from is not listed in the signed payload
    #[error("Url {0} not listed in doc")]
    UrlNotAuthorized(String),

    #[error("Document does not declare a _ROOT key")]
    RootKeyMissing,

    #[error("Malformed root key: {0}")]
    MalformedKey(String),

    /// Root key is well formed but not in the pinned keychain
    #[error("Root key {key_id} is not in the pinned keychain")]
    UntrustedRootKey { key_id: String },

    #[error("Signature of {0} not valid")]
    SignatureInvalid(String),

    #[error("Signing failed: {0}")]
    Signing(#[from] KeyringError),

    #[error("Request version {requested} not supported: installed version supports only version {supported:.2} and down")]
    UnsupportedVersion { requested: f64, supported: f64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocumentError {
    /// Short name of the pipeline step that failed, for operator output.
    pub fn step(&self) -> &'static str {
        match self {
            DocumentError::InvalidInput(_) => "input",
            DocumentError::NoReachableSource { .. } => "fetch",
            DocumentError::MalformedEnvelope(_) => "envelope",
            DocumentError::MalformedPayload(_) => "payload",
            DocumentError::UrlNotAuthorized(_) => "url-authorization",
            DocumentError::RootKeyMissing
            | DocumentError::MalformedKey(_)
            | DocumentError::UntrustedRootKey { .. } => "root-key",
            DocumentError::SignatureInvalid(_) => "signature",
            DocumentError::Signing(_) => "signing",
            DocumentError::UnsupportedVersion { .. } => "request-version",
            DocumentError::Serialization(_) => "serialization",
            DocumentError::Io(_) => "io",
        }
    }
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;
