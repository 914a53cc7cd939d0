//! Ed25519 key material with passphrase-sealed secret halves.
//!
//! Secret keys are never held in memory in the clear outside of
//! [`SealedSecretKey::with_unlocked`]. At rest (and while merely loaded) the
//! 32-byte Ed25519 seed is encrypted with ChaCha20-Poly1305 under a key
//! derived from the passphrase with Argon2id.
//!
//! # Text forms
//!
//! - Public: `ed25519-pub:<base64 32 bytes>`
//! - Sealed secret: `ed25519-sealed:<base64 header ‖ salt ‖ nonce ‖ ciphertext>`
//!
//! The sealed header carries the KDF cost parameters and is bound to the
//! ciphertext as associated data, so a tampered header fails to unlock.
//! Costs above the [`KdfConfig`] ceilings are refused when the text is parsed.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use trustdoc_core::KdfConfig;
use zeroize::Zeroizing;

pub const PUBLIC_KEY_PREFIX: &str = "ed25519-pub:";
pub const SEALED_KEY_PREFIX: &str = "ed25519-sealed:";

const SEALED_FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = 1 + 4 * 3;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const SEED_LEN: usize = 32;
const TAG_LEN: usize = 16;
const SEALED_LEN: usize = HEADER_LEN + SALT_LEN + NONCE_LEN + SEED_LEN + TAG_LEN;

/// Errors raised by key material handling.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Wrong passphrase or corrupted ciphertext; AEAD cannot tell them apart.
    #[error("Decryption failed: passphrase does not unlock the secret key")]
    DecryptionFailed,

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid signature encoding: {0}")]
    InvalidSignature(String),
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub m_cost_kib: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::from(&KdfConfig::default())
    }
}

impl From<&KdfConfig> for KdfParams {
    fn from(config: &KdfConfig) -> Self {
        Self {
            m_cost_kib: config.m_cost_kib,
            t_cost: config.t_cost,
            p_cost: config.p_cost,
        }
    }
}

impl KdfParams {
    /// Minimum legal Argon2 costs.
    ///
    /// ⚠️ Only for tests and fixtures; offers no brute-force resistance.
    pub fn insecure_fast() -> Self {
        Self {
            m_cost_kib: 8,
            t_cost: 1,
            p_cost: 1,
        }
    }

    fn encode_header(&self) -> [u8; HEADER_LEN] {
        let mut header = [0u8; HEADER_LEN];
        header[0] = SEALED_FORMAT_VERSION;
        header[1..5].copy_from_slice(&self.m_cost_kib.to_le_bytes());
        header[5..9].copy_from_slice(&self.t_cost.to_le_bytes());
        header[9..13].copy_from_slice(&self.p_cost.to_le_bytes());
        header
    }

    fn decode_header(header: &[u8]) -> Result<Self, KeyError> {
        if header[0] != SEALED_FORMAT_VERSION {
            return Err(KeyError::InvalidKeyMaterial(format!(
                "unsupported sealed key version {}",
                header[0]
            )));
        }
        let word = |i: usize| u32::from_le_bytes([header[i], header[i + 1], header[i + 2], header[i + 3]]);
        let params = Self {
            m_cost_kib: word(1),
            t_cost: word(5),
            p_cost: word(9),
        };
        params.check()?;
        Ok(params)
    }

    /// Refuse costs outside the [`KdfConfig`] ceilings.
    ///
    /// The header is only authenticated after Argon2 has run, so a corrupted
    /// cost must be caught here or it drives the KDF.
    fn check(&self) -> Result<(), KeyError> {
        if self.m_cost_kib > KdfConfig::MAX_M_COST_KIB
            || self.t_cost > KdfConfig::MAX_T_COST
            || self.p_cost > KdfConfig::MAX_P_COST
        {
            return Err(KeyError::InvalidKeyMaterial(format!(
                "KDF costs out of range: m_cost_kib={}, t_cost={}, p_cost={}",
                self.m_cost_kib, self.t_cost, self.p_cost
            )));
        }
        self.argon2().map(|_| ())
    }

    fn argon2(&self) -> Result<Argon2<'static>, KeyError> {
        let params = Params::new(self.m_cost_kib, self.t_cost, self.p_cost, Some(SEED_LEN))
            .map_err(|e| KeyError::InvalidKeyMaterial(format!("bad KDF parameters: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    fn derive(&self, passphrase: &str, salt: &[u8]) -> Result<Zeroizing<[u8; 32]>, KeyError> {
        let mut key = Zeroizing::new([0u8; 32]);
        self.argon2()?
            .hash_password_into(passphrase.as_bytes(), salt, &mut key[..])
            .map_err(|e| KeyError::Signing(format!("key derivation failed: {}", e)))?;
        Ok(key)
    }
}

/// Public (verifying) half of a root keypair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    inner: VerifyingKey,
}

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let array: [u8; 32] = bytes.try_into().map_err(|_| {
            KeyError::InvalidKeyMaterial(format!(
                "public key must be 32 bytes, got {}",
                bytes.len()
            ))
        })?;
        let inner = VerifyingKey::from_bytes(&array)
            .map_err(|e| KeyError::InvalidKeyMaterial(format!("not a curve point: {}", e)))?;
        Ok(Self { inner })
    }

    pub fn from_text(text: &str) -> Result<Self, KeyError> {
        let encoded = text.trim().strip_prefix(PUBLIC_KEY_PREFIX).ok_or_else(|| {
            KeyError::InvalidKeyMaterial(format!("public key must start with '{}'", PUBLIC_KEY_PREFIX))
        })?;
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| KeyError::InvalidKeyMaterial(format!("public key base64: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_text(&self) -> String {
        format!("{}{}", PUBLIC_KEY_PREFIX, BASE64.encode(self.inner.as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.inner.as_bytes()
    }

    /// Stable identifier: first 16 bytes of the BLAKE3 digest, hex encoded.
    pub fn key_id(&self) -> String {
        let hash = blake3::hash(self.inner.as_bytes());
        hex::encode(&hash.as_bytes()[..16])
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.inner
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(inner: VerifyingKey) -> Self {
        Self { inner }
    }
}

/// Secret half of a root keypair, encrypted under a passphrase.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedSecretKey {
    params: KdfParams,
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

impl std::fmt::Debug for SealedSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedSecretKey")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl SealedSecretKey {
    /// Seal an Ed25519 seed under `passphrase`.
    pub fn seal(seed: &[u8; 32], passphrase: &str, params: KdfParams) -> Result<Self, KeyError> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut nonce);

        params.check()?;
        let key = params.derive(passphrase, &salt)?;
        let cipher = ChaCha20Poly1305::new_from_slice(&key[..])
            .map_err(|e| KeyError::Signing(format!("cipher init: {}", e)))?;
        let header = params.encode_header();
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: seed,
                    aad: &header,
                },
            )
            .map_err(|_| KeyError::Signing("sealing secret key failed".to_string()))?;

        Ok(Self {
            params,
            salt,
            nonce,
            ciphertext,
        })
    }

    pub fn from_text(text: &str) -> Result<Self, KeyError> {
        let encoded = text.trim().strip_prefix(SEALED_KEY_PREFIX).ok_or_else(|| {
            KeyError::InvalidKeyMaterial(format!("secret key must start with '{}'", SEALED_KEY_PREFIX))
        })?;
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| KeyError::InvalidKeyMaterial(format!("secret key base64: {}", e)))?;
        if bytes.len() != SEALED_LEN {
            return Err(KeyError::InvalidKeyMaterial(format!(
                "sealed secret key must be {} bytes, got {}",
                SEALED_LEN,
                bytes.len()
            )));
        }

        let (header, rest) = bytes.split_at(HEADER_LEN);
        let (salt, rest) = rest.split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let params = KdfParams::decode_header(header)?;
        let mut salt_array = [0u8; SALT_LEN];
        salt_array.copy_from_slice(salt);
        let mut nonce_array = [0u8; NONCE_LEN];
        nonce_array.copy_from_slice(nonce);

        Ok(Self {
            params,
            salt: salt_array,
            nonce: nonce_array,
            ciphertext: ciphertext.to_vec(),
        })
    }

    pub fn to_text(&self) -> String {
        let mut bytes = Vec::with_capacity(SEALED_LEN);
        bytes.extend_from_slice(&self.params.encode_header());
        bytes.extend_from_slice(&self.salt);
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        format!("{}{}", SEALED_KEY_PREFIX, BASE64.encode(bytes))
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    /// Run `f` with the unlocked signing key.
    ///
    /// The decrypted seed and the [`SigningKey`] built from it are dropped
    /// (and zeroized) before this returns, whether `f` succeeds or not.
    pub fn with_unlocked<T, F>(&self, passphrase: &str, f: F) -> Result<T, KeyError>
    where
        F: FnOnce(&SigningKey) -> Result<T, KeyError>,
    {
        let key = self.params.derive(passphrase, &self.salt)?;
        let cipher = ChaCha20Poly1305::new_from_slice(&key[..])
            .map_err(|e| KeyError::Signing(format!("cipher init: {}", e)))?;
        let header = self.params.encode_header();
        let seed = Zeroizing::new(
            cipher
                .decrypt(
                    Nonce::from_slice(&self.nonce),
                    Payload {
                        msg: &self.ciphertext,
                        aad: &header,
                    },
                )
                .map_err(|_| {
                    tracing::debug!("Sealed key did not open: wrong passphrase or corrupted ciphertext");
                    KeyError::DecryptionFailed
                })?,
        );

        let seed: Zeroizing<[u8; SEED_LEN]> = Zeroizing::new(
            seed.as_slice()
                .try_into()
                .map_err(|_| KeyError::InvalidKeyMaterial("unlocked seed has wrong length".to_string()))?,
        );
        let signing_key = SigningKey::from_bytes(&seed);
        f(&signing_key)
    }
}

/// Generate a fresh keypair, sealing the secret half under `passphrase`.
pub fn generate_keypair(
    passphrase: &str,
    params: KdfParams,
) -> Result<(SealedSecretKey, PublicKey), KeyError> {
    let mut seed = Zeroizing::new([0u8; SEED_LEN]);
    OsRng.fill_bytes(&mut seed[..]);

    let public = PublicKey::from(SigningKey::from_bytes(&seed).verifying_key());
    let sealed = SealedSecretKey::seal(&seed, passphrase, params)?;
    Ok((sealed, public))
}
