//! Ordered, audited collection of trusted root keys.
//!
//! Keys are appended in admission order and never reordered or removed.
//! Admission runs the key's self-test unless the caller explicitly skips
//! it (bootstrap import from an already-trusted source). Either way exactly
//! one audit record is emitted per attempt.

use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use trustdoc_crypto::PublicKey;

use crate::audit::{AuditOutcome, AuditRecord, AuditSink};
use crate::root_key::RootKey;

/// Chain of trusted root keys.
///
/// Mutation is single-writer: the admission lock is held across the append
/// and its audit record, so record order always matches entry order. The
/// entries lock is released before the sink runs, so a sink may read the
/// chain.
pub struct RootKeyChain {
    entries: RwLock<Vec<Arc<RootKey>>>,
    admission: Mutex<()>,
    audit: Arc<dyn AuditSink>,
}

impl RootKeyChain {
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        tracing::info!("Keychain initialized");
        Self {
            entries: RwLock::new(Vec::new()),
            admission: Mutex::new(()),
            audit,
        }
    }

    /// Bootstrap a chain from keys that are trusted by provenance.
    /// Every key is admitted with validation skipped.
    pub fn with_keys(audit: Arc<dyn AuditSink>, keys: impl IntoIterator<Item = RootKey>) -> Self {
        let chain = Self::new(audit);
        for key in keys {
            chain.add(key, "", true);
        }
        chain
    }

    /// Try to admit `key`.
    ///
    /// With `skip_validation` the key is admitted unconditionally. Otherwise
    /// it is admitted only if [`RootKey::is_valid`] passes for `passphrase`.
    /// A failed self-test is not an error: the chain is left unchanged and
    /// `false` is returned.
    pub fn add(&self, key: RootKey, passphrase: &str, skip_validation: bool) -> bool {
        // The self-test unlocks the key (Argon2), so keep it outside the lock
        let outcome = if skip_validation {
            AuditOutcome::SkippedValidation
        } else if key.is_valid(passphrase) {
            AuditOutcome::Admitted
        } else {
            AuditOutcome::Rejected
        };

        let record = AuditRecord::new(outcome, key.name(), key.key_id());
        let _admission = self.admission.lock().unwrap_or_else(PoisonError::into_inner);
        if outcome != AuditOutcome::Rejected {
            self.write().push(Arc::new(key));
        }
        self.audit.record(&record);

        outcome != AuditOutcome::Rejected
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Snapshot of the entries, oldest first.
    pub fn entries(&self) -> Vec<Arc<RootKey>> {
        self.read().clone()
    }

    /// First (oldest) entry with this name.
    pub fn get(&self, name: &str) -> Option<Arc<RootKey>> {
        self.read().iter().find(|k| k.name() == name).cloned()
    }

    pub fn get_by_key_id(&self, key_id: &str) -> Option<Arc<RootKey>> {
        self.read().iter().find(|k| k.key_id() == key_id).cloned()
    }

    pub fn public_keys(&self) -> Vec<PublicKey> {
        self.read().iter().map(|k| *k.public_key()).collect()
    }

    pub fn contains_public_key(&self, public: &PublicKey) -> bool {
        self.read().iter().any(|k| k.public_key() == public)
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<RootKey>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<RootKey>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RootKeyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootKeyChain")
            .field("entries", &*self.read())
            .finish_non_exhaustive()
    }
}
