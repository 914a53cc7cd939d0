//! Substitution and tampering attacks against the verification pipeline
//!
//! Each scenario plays an attacker who controls one mirror:
//! - replaying a genuine document from a location it does not list
//! - editing a genuine document in transit
//! - re-rooting a document under the attacker's own key
//! - stripping or corrupting the signature block

use std::sync::Arc;
use std::time::Duration;

use trustdoc_crypto::SIGNATURE_HEADER;
use trustdoc_document::{
    DocumentError, TrustDocument, TrustDocumentFetcher, TrustDocumentVerifier,
};
use trustdoc_keys::{MemoryAuditSink, RootKeyChain};

use crate::test_utils::{init_tracing, issue_for, test_root_key, TestMirrors};

const GENUINE: &str = "https://genuine.example/trust.asc";
const ROGUE: &str = "https://rogue.example/trust.asc";

fn attempt(
    mirrors: &TestMirrors,
    urls: &[&str],
    verifier: &TrustDocumentVerifier,
) -> Result<TrustDocument, DocumentError> {
    let fetcher = TrustDocumentFetcher::new(mirrors, Duration::from_millis(50));
    let mut doc = TrustDocument::new(urls.iter().copied())?;
    doc.load(&fetcher)?;
    doc.validate(verifier)?;
    Ok(doc)
}

#[test]
fn test_replayed_document_refused_at_url_gate() {
    init_tracing();
    let key = test_root_key("owner");
    let genuine = issue_for(&key, &[GENUINE]);

    // Bytes are untouched and the signature is valid; only the location differs
    let mirrors = TestMirrors::new().serve(ROGUE, genuine);
    let err = attempt(&mirrors, &[ROGUE], &TrustDocumentVerifier::new()).unwrap_err();

    assert!(matches!(err, DocumentError::UrlNotAuthorized(ref url) if url == ROGUE));
}

#[test]
fn test_injected_url_breaks_signature() {
    init_tracing();
    let key = test_root_key("owner");
    let genuine = issue_for(&key, &[GENUINE]);

    // Attacker adds their mirror to the url list so the url gate passes
    let forged = genuine.replacen(
        &format!("\"{}\"", GENUINE),
        &format!("\"{}\",\n    \"{}\"", GENUINE, ROGUE),
        1,
    );
    assert_ne!(forged, genuine);

    let mirrors = TestMirrors::new().serve(ROGUE, forged);
    let err = attempt(&mirrors, &[ROGUE], &TrustDocumentVerifier::new()).unwrap_err();
    assert!(matches!(err, DocumentError::SignatureInvalid(ref url) if url == ROGUE));
}

#[test]
fn test_rerooted_document_needs_pinning() {
    init_tracing();
    let owner = test_root_key("owner");
    let attacker = test_root_key("attacker");
    let rerooted = issue_for(&attacker, &[ROGUE]);
    let mirrors = TestMirrors::new().serve(ROGUE, rerooted);

    // A self-rooted document is internally consistent
    assert!(attempt(&mirrors, &[ROGUE], &TrustDocumentVerifier::new()).is_ok());

    // Pinning the owner's key refuses it
    let chain = Arc::new(RootKeyChain::new(Arc::new(MemoryAuditSink::new())));
    chain.add(owner, "", true);
    let pinned = TrustDocumentVerifier::with_pinned_roots(chain);

    let err = attempt(&mirrors, &[ROGUE], &pinned).unwrap_err();
    match err {
        DocumentError::UntrustedRootKey { key_id } => assert_eq!(key_id, attacker.key_id()),
        other => panic!("expected UntrustedRootKey, got {}", other),
    }
}

#[test]
fn test_stripped_signature_is_malformed() {
    init_tracing();
    let key = test_root_key("owner");
    let genuine = issue_for(&key, &[GENUINE]);

    let stripped = match genuine.find(SIGNATURE_HEADER) {
        Some(pos) => genuine[..pos].to_string(),
        None => panic!("issued document has no signature block"),
    };
    let mirrors = TestMirrors::new().serve(GENUINE, stripped);

    let err = attempt(&mirrors, &[GENUINE], &TrustDocumentVerifier::new()).unwrap_err();
    assert!(matches!(err, DocumentError::MalformedEnvelope(_)));
    assert_eq!(err.step(), "envelope");
}

#[test]
fn test_bad_mirror_does_not_fall_through() {
    init_tracing();
    let key = test_root_key("owner");
    let genuine = issue_for(&key, &[GENUINE, ROGUE]);

    // The first reachable mirror wins even if its content is bad; verification
    // failure is terminal rather than a signal to try the next mirror
    let mirrors = TestMirrors::new()
        .serve(ROGUE, "garbage")
        .serve(GENUINE, genuine);

    let err = attempt(&mirrors, &[ROGUE, GENUINE], &TrustDocumentVerifier::new()).unwrap_err();
    assert!(matches!(err, DocumentError::MalformedEnvelope(_)));
    assert_eq!(mirrors.contacted(), vec![ROGUE]);
}
