//! Signed payload carried inside a trust document envelope.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trustdoc_crypto::PublicKey;

/// Name of the key entry that verifies the document itself.
pub const ROOT_KEY_NAME: &str = "_ROOT";

/// JSON body of a trust document.
///
/// `urls` lists every location the signer allows this document to be
/// served from; `keys` maps key names to public key material and must
/// contain [`ROOT_KEY_NAME`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustPayload {
    pub urls: Vec<String>,
    pub keys: BTreeMap<String, KeyEntry>,
}

/// One named key in the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEntry {
    /// Public key text (`ed25519-pub:...`)
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl KeyEntry {
    pub fn from_public_key(public: &PublicKey) -> Self {
        Self {
            key: public.to_text(),
            name: None,
            comment: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

impl TrustPayload {
    /// Payload authorizing `urls` with `root` as the document key.
    pub fn new<I, S>(urls: I, root: &PublicKey) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys = BTreeMap::new();
        keys.insert(ROOT_KEY_NAME.to_string(), KeyEntry::from_public_key(root));
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            keys,
        }
    }

    pub fn with_key(mut self, name: impl Into<String>, entry: KeyEntry) -> Self {
        self.keys.insert(name.into(), entry);
        self
    }

    pub fn allows_url(&self, url: &str) -> bool {
        self.urls.iter().any(|u| u == url)
    }

    pub fn root_key_entry(&self) -> Option<&KeyEntry> {
        self.keys.get(ROOT_KEY_NAME)
    }
}
