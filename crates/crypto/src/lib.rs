//! Cryptographic primitives for TrustDoc.
//!
//! This crate is the key-material capability the rest of the workspace
//! consumes: parsing, signing and verifying with asymmetric keys, plus the
//! signed envelope that trust documents travel in.
//!
//! # Core Capabilities
//!
//! - **Key Material**: Ed25519 public keys and passphrase-sealed secret keys
//! - **Digital Signatures**: Detached signatures over arbitrary bytes
//! - **Signed Envelope**: Cleartext armor carrying a body and its signature
//!
//! # Supported Algorithms
//!
//! - **Signatures**: Ed25519
//! - **Key sealing**: Argon2id key derivation, ChaCha20-Poly1305 AEAD
//! - **Fingerprints**: BLAKE3
//!
//! # Security Principles
//!
//! - Never roll custom cryptographic primitives
//! - Secret keys are only unlocked inside a scoped call and zeroized after
//! - Secrets must never be logged or hardcoded

pub mod envelope;
pub mod keys;
pub mod signing;

#[cfg(test)]
mod test_vectors;

pub use envelope::{
    normalize_line_endings, EnvelopeError, SignedEnvelope, DOCUMENT_HEADER, SIGNATURE_FOOTER,
    SIGNATURE_HEADER,
};
pub use keys::{generate_keypair, KdfParams, KeyError, PublicKey, SealedSecretKey};
pub use signing::{sign_detached, verify_detached, DetachedSignature};
