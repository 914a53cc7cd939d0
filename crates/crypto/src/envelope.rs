//! Cleartext-signed envelope.
//!
//! A trust document travels as readable text with an inline signature block:
//!
//! ```text
//! -----BEGIN TRUST DOCUMENT-----
//! {"urls": [...], "keys": {...}}
//! -----BEGIN TRUST SIGNATURE-----
//! <base64 Ed25519 signature>
//! -----END TRUST SIGNATURE-----
//! ```
//!
//! Body lines that begin with `-` are dash-escaped as `- -...` so they can
//! never be mistaken for armor lines. The signature covers the un-escaped
//! body with LF line endings. Transports routinely rewrite line endings, so
//! both the signer and the verifier normalize CRLF to LF before touching
//! the bytes.

use std::borrow::Cow;

use thiserror::Error;

use crate::keys::{KeyError, PublicKey, SealedSecretKey};
use crate::signing::{sign_detached, verify_detached, DetachedSignature};

pub const DOCUMENT_HEADER: &str = "-----BEGIN TRUST DOCUMENT-----";
pub const SIGNATURE_HEADER: &str = "-----BEGIN TRUST SIGNATURE-----";
pub const SIGNATURE_FOOTER: &str = "-----END TRUST SIGNATURE-----";

const BASE64_LINE_WIDTH: usize = 64;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Envelope is not valid UTF-8")]
    NotUtf8,

    #[error("Malformed envelope: {0}")]
    Malformed(String),
}

/// Canonicalize CRLF to LF.
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains("\r\n") {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Signed body plus its detached signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    body: String,
    signature: DetachedSignature,
}

impl SignedEnvelope {
    pub fn new(body: &str, signature: DetachedSignature) -> Self {
        Self {
            body: normalize_line_endings(body).into_owned(),
            signature,
        }
    }

    /// Normalize `body` and sign it with the unlocked secret key.
    pub fn sign(body: &str, secret: &SealedSecretKey, passphrase: &str) -> Result<Self, KeyError> {
        let body = normalize_line_endings(body).into_owned();
        let signature = sign_detached(secret, passphrase, body.as_bytes())?;
        Ok(Self { body, signature })
    }

    /// Decode raw bytes, normalize line endings, then parse.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, EnvelopeError> {
        let text = std::str::from_utf8(raw).map_err(|_| EnvelopeError::NotUtf8)?;
        Self::parse(&normalize_line_endings(text))
    }

    /// Parse armored text. Expects LF line endings.
    pub fn parse(text: &str) -> Result<Self, EnvelopeError> {
        let mut lines = text.split('\n');

        if !lines.by_ref().any(|line| line.trim_end() == DOCUMENT_HEADER) {
            return Err(EnvelopeError::Malformed(
                "missing document header".to_string(),
            ));
        }

        let mut body_lines = Vec::new();
        let mut found_signature = false;
        for line in lines.by_ref() {
            if line.trim_end() == SIGNATURE_HEADER {
                found_signature = true;
                break;
            }
            if let Some(escaped) = line.strip_prefix("- ") {
                body_lines.push(escaped);
            } else if line.starts_with('-') {
                return Err(EnvelopeError::Malformed(format!(
                    "unescaped dash line in body: {:?}",
                    line
                )));
            } else {
                body_lines.push(line);
            }
        }
        if !found_signature {
            return Err(EnvelopeError::Malformed(
                "missing signature block".to_string(),
            ));
        }

        let mut encoded = String::new();
        let mut found_footer = false;
        for line in lines {
            let line = line.trim();
            if line == SIGNATURE_FOOTER {
                found_footer = true;
                break;
            }
            encoded.push_str(line);
        }
        if !found_footer {
            return Err(EnvelopeError::Malformed(
                "missing signature footer".to_string(),
            ));
        }

        let body = body_lines.join("\n");
        if body.trim().is_empty() {
            return Err(EnvelopeError::Malformed("empty body".to_string()));
        }

        let signature = DetachedSignature::from_text(&encoded)
            .map_err(|e| EnvelopeError::Malformed(e.to_string()))?;

        Ok(Self { body, signature })
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn signature(&self) -> &DetachedSignature {
        &self.signature
    }

    pub fn verify_with(&self, public: &PublicKey) -> bool {
        verify_detached(public, self.body.as_bytes(), &self.signature)
    }

    /// Render the envelope in its armored text form.
    pub fn armor(&self) -> String {
        let mut out = String::with_capacity(self.body.len() + 256);
        out.push_str(DOCUMENT_HEADER);
        out.push('\n');

        for line in self.body.split('\n') {
            if line.starts_with('-') {
                out.push_str("- ");
            }
            out.push_str(line);
            out.push('\n');
        }

        out.push_str(SIGNATURE_HEADER);
        out.push('\n');
        let encoded = self.signature.to_base64();
        for chunk in encoded.as_bytes().chunks(BASE64_LINE_WIDTH) {
            // base64 output is ASCII
            out.push_str(&String::from_utf8_lossy(chunk));
            out.push('\n');
        }
        out.push_str(SIGNATURE_FOOTER);
        out.push('\n');
        out
    }
}
