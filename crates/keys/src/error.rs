//! Error types for root key management.

use thiserror::Error;
use trustdoc_crypto::KeyError;

/// Errors that can occur while building, using, or storing root keys.
#[derive(Debug, Error)]
pub enum KeyringError {
    /// One of the key halves could not be parsed
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Passphrase does not unlock the secret half
    #[error("Decryption failed: wrong passphrase or corrupted secret key")]
    DecryptionFailed,

    /// Any other failure while producing a signature
    #[error("Signing error: {0}")]
    Signing(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<KeyError> for KeyringError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::InvalidKeyMaterial(reason) => KeyringError::InvalidKeyMaterial(reason),
            KeyError::DecryptionFailed => KeyringError::DecryptionFailed,
            KeyError::Signing(reason) => KeyringError::Signing(reason),
            KeyError::InvalidSignature(reason) => KeyringError::Signing(reason),
        }
    }
}

/// Result type for root key operations.
pub type KeyringResult<T> = Result<T, KeyringError>;
