//! Core functionality for TrustDoc.
//!
//! This crate provides the configuration, logging, and base error types
//! shared by the key management and document verification crates.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, FetchConfig, KdfConfig, KeysConfig, LoggingConfig};
pub use error::{CoreError, Result};
