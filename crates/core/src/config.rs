//! Configuration management for TrustDoc.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub keys: KeysConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Upper bound for a single mirror attempt, in milliseconds
    pub timeout_ms: u64,
    pub user_agent: String,
    /// Honor `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY` from the environment
    pub use_system_proxy: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Directory holding `*.json` root key files
    pub keychain_dir: Option<PathBuf>,
    pub kdf: KdfConfig,
}

/// Argon2id cost parameters used when sealing secret keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfConfig {
    pub m_cost_kib: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
    pub level: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            user_agent: concat!("trustdoc/", env!("CARGO_PKG_VERSION")).to_string(),
            use_system_proxy: true,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl KdfConfig {
    /// Upper bounds for each cost. Sealed keys claiming more are refused
    /// before Argon2 runs.
    pub const MAX_M_COST_KIB: u32 = 1024 * 1024;
    pub const MAX_T_COST: u32 = 64;
    pub const MAX_P_COST: u32 = 16;
}

impl Default for KdfConfig {
    fn default() -> Self {
        // argon2 crate defaults (OWASP minimums for Argon2id)
        Self {
            m_cost_kib: 19 * 1024,
            t_cost: 2,
            p_cost: 1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would disable a required bound.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.timeout_ms == 0 {
            return Err(CoreError::InvalidConfig {
                field: "fetch.timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let kdf = &self.keys.kdf;
        if kdf.t_cost == 0 || kdf.p_cost == 0 {
            return Err(CoreError::InvalidConfig {
                field: "keys.kdf".to_string(),
                reason: "t_cost and p_cost must be at least 1".to_string(),
            });
        }
        if kdf.m_cost_kib < 8 * kdf.p_cost {
            return Err(CoreError::InvalidConfig {
                field: "keys.kdf.m_cost_kib".to_string(),
                reason: format!("must be at least {} (8 * p_cost)", 8 * kdf.p_cost),
            });
        }
        if kdf.m_cost_kib > KdfConfig::MAX_M_COST_KIB
            || kdf.t_cost > KdfConfig::MAX_T_COST
            || kdf.p_cost > KdfConfig::MAX_P_COST
        {
            return Err(CoreError::InvalidConfig {
                field: "keys.kdf".to_string(),
                reason: format!(
                    "costs may not exceed m_cost_kib={}, t_cost={}, p_cost={}",
                    KdfConfig::MAX_M_COST_KIB,
                    KdfConfig::MAX_T_COST,
                    KdfConfig::MAX_P_COST
                ),
            });
        }

        Ok(())
    }
}
