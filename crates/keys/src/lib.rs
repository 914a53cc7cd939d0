//! Root key lifecycle management for TrustDoc.
//!
//! Root keys are the trust anchors that sign trust documents. This crate
//! covers their whole lifetime on the operator side:
//!
//! - **Construction**: parse both halves from text, or generate a new pair
//! - **Self-test**: prove a key can sign and verify with a given passphrase
//! - **Chaining**: an ordered, audited [`RootKeyChain`] that only admits keys
//!   that pass the self-test (or are explicitly bootstrapped)
//! - **Import**: load a directory of key files into a chain
//!
//! # Security Model
//!
//! - Secret halves stay sealed except inside a single signing call
//! - Every admission attempt is recorded through an injected [`AuditSink`]
//! - A wrong passphrase is an expected outcome, not an error; a malformed
//!   key file is an error

pub mod audit;
pub mod error;
pub mod keychain;
pub mod loader;
pub mod root_key;

pub use audit::{AuditOutcome, AuditRecord, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use error::{KeyringError, KeyringResult};
pub use keychain::RootKeyChain;
pub use loader::{KeychainDirLoader, LoadOptions, LoadReport};
pub use root_key::{RootKey, SELF_TEST_MESSAGE};
