//! Detached Ed25519 signatures.
//!
//! Signing always goes through a [`SealedSecretKey`] so the secret half is
//! only unlocked for the duration of one call. Verification needs nothing
//! but the [`PublicKey`] and never fails loudly: a bad signature is `false`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signature, Signer, Verifier};

use crate::keys::{KeyError, PublicKey, SealedSecretKey};

pub const SIGNATURE_PREFIX: &str = "ed25519-sig:";

/// Ed25519 signature kept apart from the data it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetachedSignature {
    bytes: [u8; 64],
}

impl DetachedSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 64] = bytes.try_into().map_err(|_| {
            KeyError::InvalidSignature(format!("expected 64 bytes, got {}", bytes.len()))
        })?;
        Ok(Self { bytes })
    }

    /// Parse `ed25519-sig:<base64>`; the bare base64 form is accepted too.
    pub fn from_text(text: &str) -> Result<Self, KeyError> {
        let text = text.trim();
        let encoded = text.strip_prefix(SIGNATURE_PREFIX).unwrap_or(text);
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| KeyError::InvalidSignature(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_text(&self) -> String {
        format!("{}{}", SIGNATURE_PREFIX, self.to_base64())
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.bytes
    }
}

/// Sign `data` with the secret half, unlocking it with `passphrase`.
pub fn sign_detached(
    secret: &SealedSecretKey,
    passphrase: &str,
    data: &[u8],
) -> Result<DetachedSignature, KeyError> {
    secret.with_unlocked(passphrase, |signing_key| {
        let signature = signing_key
            .try_sign(data)
            .map_err(|e| KeyError::Signing(e.to_string()))?;
        Ok(DetachedSignature {
            bytes: signature.to_bytes(),
        })
    })
}

/// Verify a detached signature. Mismatch is `false`, not an error.
pub fn verify_detached(public: &PublicKey, data: &[u8], signature: &DetachedSignature) -> bool {
    let signature = Signature::from_bytes(signature.as_bytes());
    public.verifying_key().verify(data, &signature).is_ok()
}
