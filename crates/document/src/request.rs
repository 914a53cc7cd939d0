//! Outbound requests to the master key provider.
//!
//! A request is a small JSON object wrapped under a protocol tag:
//!
//! ```json
//! {"TrustDoc": {"version": 0.1, "action": "new_user", "data": {...}, "timestamp": 1700000000}}
//! ```
//!
//! Requests are handed over as files, optionally cleartext-signed with a
//! root key so the master can check them with the same envelope verifier.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use trustdoc_crypto::{normalize_line_endings, PublicKey, SignedEnvelope};
use trustdoc_keys::RootKey;

use crate::error::{DocumentError, DocumentResult};

/// Highest request version this build understands.
pub const PROTOCOL_VERSION: f64 = 0.1;

/// Wrapper key around every request body.
pub const PROTOCOL_TAG: &str = "TrustDoc";

pub const ACTION_NEW_USER: &str = "new_user";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterRequest {
    pub version: f64,
    pub action: String,
    pub data: Value,
    pub timestamp: u64,
}

#[derive(Serialize, Deserialize)]
struct Tagged {
    #[serde(rename = "TrustDoc")]
    request: MasterRequest,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn check_version(version: f64) -> DocumentResult<()> {
    if version > PROTOCOL_VERSION {
        return Err(DocumentError::UnsupportedVersion {
            requested: version,
            supported: PROTOCOL_VERSION,
        });
    }
    Ok(())
}

impl MasterRequest {
    /// Request at the current protocol version, stamped with the current time.
    pub fn new(action: impl Into<String>, data: Value) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            action: action.into(),
            data,
            timestamp: unix_now(),
        }
    }

    pub fn with_version(mut self, version: f64) -> DocumentResult<Self> {
        check_version(version)?;
        self.version = version;
        Ok(self)
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn to_json(&self) -> DocumentResult<String> {
        Ok(serde_json::to_string(&Tagged {
            request: self.clone(),
        })?)
    }

    /// Parse the tagged form. Versions newer than this build are refused.
    pub fn from_json(json: &str) -> DocumentResult<Self> {
        let tagged: Tagged = serde_json::from_str(json)?;
        check_version(tagged.request.version)?;
        Ok(tagged.request)
    }

    /// Write the unsigned JSON form to `path`.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> DocumentResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        tracing::info!(action = %self.action, path = %path.display(), "Wrote master request");
        Ok(())
    }

    /// Cleartext-sign the JSON form with `key`.
    pub fn sign(&self, key: &RootKey, passphrase: &str) -> DocumentResult<String> {
        let envelope = key.sign_envelope(&self.to_json()?, passphrase)?;
        Ok(envelope.armor())
    }

    /// Parse a signed request and check it against `signer`.
    pub fn from_signed(armored: &str, signer: &PublicKey) -> DocumentResult<Self> {
        let envelope = SignedEnvelope::parse(&normalize_line_endings(armored))
            .map_err(|e| DocumentError::MalformedEnvelope(e.to_string()))?;
        if !envelope.verify_with(signer) {
            return Err(DocumentError::SignatureInvalid(format!(
                "request signed by {}",
                signer.key_id()
            )));
        }
        Self::from_json(envelope.body())
    }
}

/// Ask the master to register a new user.
pub fn new_user_request(name: &str, comment: &str) -> MasterRequest {
    MasterRequest::new(
        ACTION_NEW_USER,
        json!({ PROTOCOL_TAG: { "name": name, "comment": comment } }),
    )
}
