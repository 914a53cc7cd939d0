//! Cross-crate integration tests for TrustDoc
//!
//! This test suite validates:
//! - Key generation, keychain storage and audited admission
//! - Issuing, serving and verifying trust documents across mirrors
//! - Refusal of substituted, tampered and foreign-rooted documents
//! - The blocking HTTP source against a local server

pub mod test_utils;

#[cfg(test)]
mod chain_of_trust_tests;

#[cfg(test)]
mod substitution_attack_tests;

#[cfg(test)]
mod http_fetch_tests;
