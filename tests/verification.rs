//! Verifier-side verification tests.

mod utils;

use chrono::Utc;
use credvault_wallet::types::{
    CredentialStatus, Disclosure, Proof, VerifiablePresentation, VerificationStatus,
};
use credvault_wallet::verification::Verifier;
use serde_json::Value;
use utils::MockProvider;

fn presentation(credential_id: &str) -> VerifiablePresentation {
    VerifiablePresentation {
        id: "pres-001".to_string(),
        holder_id: utils::HOLDER.to_string(),
        verifier_id: "verifier-1".to_string(),
        credential_refs: vec![credential_id.to_string()],
        disclosed_claims: vec![Disclosure {
            name: "fullName".to_string(),
            value: Value::from("John Doe"),
            credential_id: credential_id.to_string(),
        }],
        nonce: "nonce-1".to_string(),
        created_at: Utc::now(),
        proof: Some(Proof {
            proof_type: "Ed25519Signature2020".to_string(),
            created: Utc::now(),
            verification_method: "did:example:holder-001#key-1".to_string(),
            proof_purpose: "authentication".to_string(),
            proof_value: "stub".to_string(),
        }),
    }
}

// A well-formed presentation over a credential in good standing verifies as
// valid and is recorded in the activity log.
#[tokio::test]
async fn valid_presentation() {
    let provider = MockProvider::new();
    let verifier = Verifier::new(provider.clone(), "verifier-1");

    let raw = serde_json::to_string(&presentation("cred-001")).expect("should serialize");
    let result = verifier.verify(&raw).await.expect("should verify");

    assert_eq!(result.status, VerificationStatus::Valid);
    assert_eq!(result.holder_id.as_deref(), Some(utils::HOLDER));
    assert_eq!(result.disclosed_claims.get("fullName"), Some(&Value::from("John Doe")));

    let events = provider.verification_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, VerificationStatus::Valid);
    assert_eq!(events[0].claim_names, vec!["fullName".to_string()]);
}

// A revoked credential fails the check, and revocation outranks expiry.
#[tokio::test]
async fn revoked_credential() {
    let provider = MockProvider::new();
    provider.set_credential_status("cred-001", CredentialStatus::Revoked);

    let verifier = Verifier::new(provider.clone(), "verifier-1");
    let raw = serde_json::to_string(&presentation("cred-001")).expect("should serialize");
    let result = verifier.verify(&raw).await.expect("should verify");

    assert_eq!(result.status, VerificationStatus::Revoked);
}

// An expired credential downgrades the verdict without being revoked.
#[tokio::test]
async fn expired_credential() {
    let provider = MockProvider::new();
    provider.set_credential_status("cred-001", CredentialStatus::Expired);

    let verifier = Verifier::new(provider.clone(), "verifier-1");
    let raw = serde_json::to_string(&presentation("cred-001")).expect("should serialize");
    let result = verifier.verify(&raw).await.expect("should verify");

    assert_eq!(result.status, VerificationStatus::Expired);
}

// Garbage and structurally broken payloads verify as invalid rather than
// erroring, and still land in the activity log.
#[tokio::test]
async fn invalid_payloads() {
    let provider = MockProvider::new();
    let verifier = Verifier::new(provider.clone(), "verifier-1");

    let result = verifier.verify("not a presentation").await.expect("should verify");
    assert_eq!(result.status, VerificationStatus::Invalid);
    assert!(result.disclosed_claims.is_empty());

    // structurally broken: no proof
    let mut broken = presentation("cred-001");
    broken.proof = None;
    let raw = serde_json::to_string(&broken).expect("should serialize");
    let result = verifier.verify(&raw).await.expect("should verify");
    assert_eq!(result.status, VerificationStatus::Invalid);

    // no disclosed claims
    let mut empty = presentation("cred-001");
    empty.disclosed_claims.clear();
    let raw = serde_json::to_string(&empty).expect("should serialize");
    let result = verifier.verify(&raw).await.expect("should verify");
    assert_eq!(result.status, VerificationStatus::Invalid);

    assert_eq!(provider.verification_events().len(), 3);
}
