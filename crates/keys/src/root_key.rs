//! Root keys: named Ed25519 keypairs used as trust anchors.
//!
//! A [`RootKey`] owns both halves of one keypair. Nothing at construction
//! time proves that the halves belong together; [`RootKey::is_valid`] is the
//! self-test that does, and [`crate::RootKeyChain`] relies on it before
//! admitting a key.

use serde::{Deserialize, Serialize};
use trustdoc_crypto::{
    generate_keypair, sign_detached, verify_detached, DetachedSignature, KdfParams, PublicKey,
    SealedSecretKey, SignedEnvelope,
};

use crate::error::{KeyringError, KeyringResult};

/// Plaintext signed and verified by the self-test.
pub const SELF_TEST_MESSAGE: &str = "This is a test";

/// Named keypair with a passphrase-sealed secret half.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "RootKeyRecord", into = "RootKeyRecord")]
pub struct RootKey {
    name: String,
    comment: String,
    secret: SealedSecretKey,
    public: PublicKey,
}

/// On-disk JSON form of a [`RootKey`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RootKeyRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    comment: String,
    private: String,
    public: String,
}

impl TryFrom<RootKeyRecord> for RootKey {
    type Error = KeyringError;

    fn try_from(record: RootKeyRecord) -> Result<Self, Self::Error> {
        RootKey::new(&record.private, &record.public, record.name, record.comment)
    }
}

impl From<RootKey> for RootKeyRecord {
    fn from(key: RootKey) -> Self {
        Self {
            private: key.secret.to_text(),
            public: key.public.to_text(),
            name: key.name,
            comment: key.comment,
        }
    }
}

impl RootKey {
    /// Build a root key from the text forms of its two halves.
    pub fn new(
        private: &str,
        public: &str,
        name: impl Into<String>,
        comment: impl Into<String>,
    ) -> KeyringResult<Self> {
        let secret = SealedSecretKey::from_text(private)
            .map_err(|e| KeyringError::InvalidKeyMaterial(format!("private half: {}", e)))?;
        let public = PublicKey::from_text(public)
            .map_err(|e| KeyringError::InvalidKeyMaterial(format!("public half: {}", e)))?;

        Ok(Self {
            name: name.into(),
            comment: comment.into(),
            secret,
            public,
        })
    }

    /// Generate a fresh keypair protected by `passphrase`.
    pub fn generate(
        passphrase: &str,
        name: impl Into<String>,
        comment: impl Into<String>,
        params: KdfParams,
    ) -> KeyringResult<Self> {
        let (secret, public) = generate_keypair(passphrase, params)?;
        let key = Self {
            name: name.into(),
            comment: comment.into(),
            secret,
            public,
        };
        tracing::info!(key_name = %key.name, key_id = %key.key_id(), "Generated root key");
        Ok(key)
    }

    /// Assemble from already-parsed halves. The pairing is not checked.
    pub fn from_parts(
        secret: SealedSecretKey,
        public: PublicKey,
        name: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            comment: comment.into(),
            secret,
            public,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn key_id(&self) -> String {
        self.public.key_id()
    }

    /// Detached signature over `data`.
    ///
    /// The secret half is unlocked only for the duration of this call.
    pub fn sign(&self, data: &[u8], passphrase: &str) -> KeyringResult<DetachedSignature> {
        Ok(sign_detached(&self.secret, passphrase, data)?)
    }

    /// Check `signature` against the public half only.
    pub fn verify(&self, data: &[u8], signature: &DetachedSignature) -> bool {
        verify_detached(&self.public, data, signature)
    }

    /// Like [`RootKey::verify`] but takes the signature's text form.
    /// Unparsable signatures simply do not verify.
    pub fn verify_text(&self, data: &[u8], signature: &str) -> bool {
        DetachedSignature::from_text(signature)
            .map(|sig| self.verify(data, &sig))
            .unwrap_or(false)
    }

    /// Sign `body` into a cleartext envelope.
    pub fn sign_envelope(&self, body: &str, passphrase: &str) -> KeyringResult<SignedEnvelope> {
        Ok(SignedEnvelope::sign(body, &self.secret, passphrase)?)
    }

    /// Self-test: sign a fixed message with the secret half and verify it
    /// with our own public half.
    ///
    /// Every failure (wrong passphrase, corrupted ciphertext, halves from
    /// different keypairs) is reported as `false`.
    pub fn is_valid(&self, passphrase: &str) -> bool {
        let data = SELF_TEST_MESSAGE.as_bytes();
        match self.sign(data, passphrase) {
            Ok(signature) => {
                let verified = self.verify(data, &signature);
                if !verified {
                    tracing::debug!(key_name = %self.name, "Self-test signature did not verify against public half");
                }
                verified
            }
            Err(e) => {
                tracing::debug!(key_name = %self.name, error = %e, "Self-test signing failed");
                false
            }
        }
    }

    pub fn to_json(&self) -> KeyringResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse the JSON form. Any failure is [`KeyringError::InvalidKeyMaterial`].
    pub fn from_json(json: &str) -> KeyringResult<Self> {
        let record: RootKeyRecord = serde_json::from_str(json)
            .map_err(|e| KeyringError::InvalidKeyMaterial(format!("key file: {}", e)))?;
        Self::try_from(record)
    }
}

impl std::fmt::Debug for RootKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootKey")
            .field("name", &self.name)
            .field("key_id", &self.key_id())
            .finish_non_exhaustive()
    }
}
