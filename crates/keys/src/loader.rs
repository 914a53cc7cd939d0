//! Keychain directory import and storage.
//!
//! A keychain directory holds one JSON file per root key (see
//! [`RootKey::to_json`]). Loading walks the `*.json` files in file-name order
//! and feeds each parsed key to [`RootKeyChain::add`]. A file that cannot be
//! parsed is logged and reported; it never aborts the rest of the import.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use crate::error::KeyringResult;
use crate::keychain::RootKeyChain;
use crate::root_key::RootKey;

const KEY_FILE_EXTENSION: &str = "json";

/// How parsed keys are admitted.
#[derive(Clone, Default)]
pub struct LoadOptions {
    /// Passphrase used for each key's self-test
    pub passphrase: Zeroizing<String>,
    /// Admit without self-test (directory is itself a trusted source)
    pub skip_validation: bool,
}

impl std::fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadOptions")
            .field("passphrase", &"<redacted>")
            .field("skip_validation", &self.skip_validation)
            .finish()
    }
}

/// Outcome of loading one directory.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Names of keys that entered the chain
    pub admitted: Vec<String>,
    /// Names of keys whose self-test failed
    pub rejected: Vec<String>,
    /// Files that could not be read or parsed, with the reason
    pub failed: Vec<(PathBuf, String)>,
    /// Whether new key files can be written here
    pub writable: bool,
}

impl LoadReport {
    pub fn total(&self) -> usize {
        self.admitted.len() + self.rejected.len() + self.failed.len()
    }
}

/// Loader bound to one keychain directory.
#[derive(Debug, Clone)]
pub struct KeychainDirLoader {
    directory: PathBuf,
}

impl KeychainDirLoader {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Whether a file can actually be created here.
    ///
    /// Creates and drops a temporary file instead of reading mode bits.
    pub fn is_writable(&self) -> bool {
        if !self.directory.is_dir() {
            return false;
        }
        match tempfile::NamedTempFile::new_in(&self.directory) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(directory = %self.directory.display(), error = %e, "Keychain directory is not writable");
                false
            }
        }
    }

    /// Import every key file into `chain`.
    ///
    /// Fails only if the directory itself cannot be listed.
    pub fn load(&self, chain: &RootKeyChain, options: &LoadOptions) -> KeyringResult<LoadReport> {
        let writable = self.is_writable();
        if !writable {
            tracing::warn!(
                directory = %self.directory.display(),
                "Will not be able to write new keys"
            );
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.directory)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(KEY_FILE_EXTENSION)
            })
            .collect();
        paths.sort();

        let mut report = LoadReport {
            writable,
            ..LoadReport::default()
        };

        for path in paths {
            let key = match fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|json| RootKey::from_json(&json).map_err(|e| e.to_string()))
            {
                Ok(key) => key,
                Err(reason) => {
                    tracing::error!(path = %path.display(), error = %reason, "Could not load key file");
                    report.failed.push((path, reason));
                    continue;
                }
            };

            let name = key.name().to_string();
            if chain.add(key, &options.passphrase, options.skip_validation) {
                report.admitted.push(name);
            } else {
                report.rejected.push(name);
            }
        }

        tracing::info!(
            directory = %self.directory.display(),
            admitted = report.admitted.len(),
            rejected = report.rejected.len(),
            failed = report.failed.len(),
            "Keychain directory loaded"
        );

        Ok(report)
    }

    /// Write `key` as a new file; never overwrites an existing one.
    pub fn store(&self, key: &RootKey) -> KeyringResult<PathBuf> {
        let path = self
            .directory
            .join(format!("{}.{}", file_stem_for(key), KEY_FILE_EXTENSION));
        let json = key.to_json()?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&path)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;

        tracing::info!(path = %path.display(), key_name = %key.name(), "Stored root key");
        Ok(path)
    }
}

/// Key name reduced to a safe file stem, falling back to the key id.
fn file_stem_for(key: &RootKey) -> String {
    let stem: String = key
        .name()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.trim_matches('_').is_empty() {
        key.key_id()
    } else {
        stem
    }
}
