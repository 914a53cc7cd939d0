//! End-to-End Chain of Trust Integration Tests
//!
//! This test suite validates the complete operator workflow:
//! 1. Root keys are generated and stored in a keychain directory
//! 2. The directory is loaded into an audited RootKeyChain
//! 3. A key from the chain issues a trust document
//! 4. The document is fetched from mirrors and verified against pinned roots
//! 5. The same key signs a master request that the master can check

use std::sync::Arc;
use std::time::Duration;

use trustdoc_document::{
    new_user_request, MasterRequest, TrustDocument, TrustDocumentFetcher, TrustDocumentVerifier,
    ROOT_KEY_NAME,
};
use trustdoc_keys::{
    AuditOutcome, KeychainDirLoader, LoadOptions, MemoryAuditSink, RootKey, RootKeyChain,
};
use zeroize::Zeroizing;

use crate::test_utils::{init_tracing, issue_for, test_root_key, TestMirrors, TEST_PASSPHRASE};

const PRIMARY: &str = "https://primary.example/trust.asc";
const BACKUP: &str = "https://backup.example/trust.asc";

#[test]
fn test_end_to_end_chain_of_trust() {
    init_tracing();

    // Step 1: generate and store keys
    tracing::info!("Step 1: Generating root keys");
    let dir = tempfile::tempdir().unwrap();
    let loader = KeychainDirLoader::new(dir.path());
    loader.store(&test_root_key("signer")).unwrap();
    loader.store(&test_root_key("backup")).unwrap();

    // Step 2: load them with validation
    tracing::info!("Step 2: Loading keychain directory");
    let sink = Arc::new(MemoryAuditSink::new());
    let chain = Arc::new(RootKeyChain::new(sink.clone()));
    let report = loader
        .load(
            &chain,
            &LoadOptions {
                passphrase: Zeroizing::new(TEST_PASSPHRASE.to_string()),
                skip_validation: false,
            },
        )
        .unwrap();
    assert_eq!(report.admitted, vec!["backup", "signer"]);
    assert_eq!(sink.count(AuditOutcome::Admitted), 2);

    // Step 3: issue with a key taken from the chain
    tracing::info!("Step 3: Issuing trust document");
    let signer: Arc<RootKey> = chain.get("signer").expect("signer should be loaded");
    let armored = issue_for(&signer, &[PRIMARY, BACKUP]);

    // Step 4: primary is down, backup serves the document
    tracing::info!("Step 4: Fetching and verifying");
    let mirrors = TestMirrors::new().serve(BACKUP, armored);
    let fetcher = TrustDocumentFetcher::new(&mirrors, Duration::from_millis(50));
    let verifier = TrustDocumentVerifier::with_pinned_roots(chain.clone());

    let mut doc = TrustDocument::new([PRIMARY, BACKUP]).unwrap();
    doc.load(&fetcher).unwrap();
    let payload = doc.validate(&verifier).unwrap().clone();

    assert!(doc.is_verified());
    assert_eq!(doc.resolved_url(), Some(BACKUP));
    assert_eq!(mirrors.contacted(), vec![PRIMARY, BACKUP]);
    assert_eq!(
        payload.keys[ROOT_KEY_NAME].key,
        signer.public_key().to_text()
    );

    // Step 5: signed master request
    tracing::info!("Step 5: Signing master request");
    let request = new_user_request("dana", "field laptop");
    let signed = request.sign(&signer, TEST_PASSPHRASE).unwrap();
    let received = MasterRequest::from_signed(&signed, signer.public_key()).unwrap();
    assert_eq!(received, request);
}

#[test]
fn test_operator_probe_sequence_audit_order() {
    init_tracing();

    let sink = Arc::new(MemoryAuditSink::new());
    let k1 = test_root_key("K1");
    let chain = RootKeyChain::with_keys(sink.clone(), [k1]);
    assert_eq!(chain.len(), 1);

    let k2 = test_root_key("K2");
    assert!(!chain.add(k2.clone(), "wrong passphrase", false));
    assert!(chain.add(k2.clone(), TEST_PASSPHRASE, false));

    let records = sink.records();
    let summary: Vec<(AuditOutcome, &str)> = records
        .iter()
        .map(|r| (r.outcome, r.key_name.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (AuditOutcome::SkippedValidation, "K1"),
            (AuditOutcome::Rejected, "K2"),
            (AuditOutcome::Admitted, "K2"),
        ]
    );
    assert_eq!(records[2].key_id, k2.key_id());

    let names: Vec<String> = chain.entries().iter().map(|k| k.name().to_string()).collect();
    assert_eq!(names, vec!["K1", "K2"]);
}

#[test]
fn test_key_round_trip_through_json_keeps_signing_power() {
    let key = test_root_key("portable");
    let restored = RootKey::from_json(&key.to_json().unwrap()).unwrap();

    // A document issued by the restored key verifies under the original's public half
    let armored = issue_for(&restored, &[PRIMARY]);
    let verified = TrustDocumentVerifier::new()
        .verify(armored.as_bytes(), PRIMARY)
        .unwrap();
    assert_eq!(&verified.root_key, key.public_key());
}
