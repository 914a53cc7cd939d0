//! Signing side of the trust document protocol.

use trustdoc_crypto::PublicKey;
use trustdoc_keys::RootKey;

use crate::error::{DocumentError, DocumentResult};
use crate::payload::TrustPayload;

/// Sign `payload` with `root_key` and return the armored envelope.
///
/// The payload's `_ROOT` entry must be the signer's own public key, so a
/// document that leaves this function always passes the verifier's
/// signature gate for every URL it lists.
pub fn issue_document(
    payload: &TrustPayload,
    root_key: &RootKey,
    passphrase: &str,
) -> DocumentResult<String> {
    let entry = payload.root_key_entry().ok_or(DocumentError::RootKeyMissing)?;
    let declared =
        PublicKey::from_text(&entry.key).map_err(|e| DocumentError::MalformedKey(e.to_string()))?;
    if &declared != root_key.public_key() {
        return Err(DocumentError::InvalidInput(format!(
            "_ROOT key {} does not match signing key {}",
            declared.key_id(),
            root_key.key_id()
        )));
    }
    if payload.urls.is_empty() {
        tracing::warn!(key_id = %root_key.key_id(), "Issuing document that lists no urls");
    }

    let body = serde_json::to_string_pretty(payload)?;
    let envelope = root_key.sign_envelope(&body, passphrase)?;

    tracing::info!(
        key_name = %root_key.name(),
        key_id = %root_key.key_id(),
        urls = payload.urls.len(),
        "Issued trust document"
    );
    Ok(envelope.armor())
}
