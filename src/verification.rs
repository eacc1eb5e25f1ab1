//! # Verification
//!
//! Verifier-side checking of a scanned presentation payload. The outcome is
//! a structured result rather than an error: an unparseable or structurally
//! broken payload verifies as `Invalid`. Every check is recorded in the
//! activity log on a best-effort basis.

use std::collections::HashMap;

use anyhow::Context as _;
use chrono::Utc;
use serde_json::Value;
use tracing::instrument;

use crate::provider::WalletGateway;
use crate::types::{
    CredentialStatus, VerifiablePresentation, VerificationEvent, VerificationResult,
    VerificationStatus,
};
use crate::Result;

/// A verifier checking presentations scanned from holders.
pub struct Verifier<P: WalletGateway> {
    provider: P,
    verifier_id: String,
}

impl<P: WalletGateway> Verifier<P> {
    /// Create a verifier.
    pub fn new(provider: P, verifier_id: impl Into<String>) -> Self {
        Self { provider, verifier_id: verifier_id.into() }
    }

    /// Verify a raw presentation payload.
    ///
    /// The verdict is `Invalid` for malformed payloads, `Revoked` when any
    /// referenced credential has been revoked or suspended, `Expired` when
    /// any has expired (and none revoked), and `Valid` otherwise. Revocation
    /// takes precedence over expiry. A result is always recorded in the
    /// activity log; a failed recording is logged and does not change the
    /// verdict.
    ///
    /// # Errors
    ///
    /// `NetworkOrServer` when a credential status lookup cannot be
    /// completed. Lookup failure never produces a `Valid` verdict.
    #[instrument(skip(self, raw), fields(verifier = %self.verifier_id))]
    pub async fn verify(&self, raw: &str) -> Result<VerificationResult> {
        let result = self.check(raw).await?;

        let event = VerificationEvent {
            id: uuid::Uuid::new_v4().to_string(),
            verifier_id: self.verifier_id.clone(),
            holder_id: result.holder_id.clone(),
            status: result.status,
            claim_names: result.disclosed_claims.keys().cloned().collect(),
            checked_at: result.checked_at,
        };
        if let Err(e) = self.provider.record_verification(&event).await {
            tracing::error!("failed to record verification event: {e}");
        }

        Ok(result)
    }

    async fn check(&self, raw: &str) -> Result<VerificationResult> {
        let presentation: VerifiablePresentation = match serde_json::from_str(raw) {
            Ok(p) => p,
            Err(e) => {
                return Ok(invalid_result(format!("payload is not a presentation: {e}")));
            }
        };

        if let Some(detail) = structural_defect(&presentation) {
            return Ok(invalid_result(detail));
        }

        let disclosed_claims: HashMap<String, Value> = presentation
            .disclosed_claims
            .iter()
            .map(|d| (d.name.clone(), d.value.clone()))
            .collect();

        let mut verdict = VerificationStatus::Valid;
        let mut detail = "All referenced credentials are in good standing".to_string();

        for credential_id in &presentation.credential_refs {
            let status = self
                .provider
                .credential_status(credential_id)
                .await
                .context("looking up credential status")?;

            match status {
                CredentialStatus::Revoked | CredentialStatus::Suspended => {
                    verdict = VerificationStatus::Revoked;
                    detail = format!("credential {credential_id} is no longer in good standing");
                    break;
                }
                CredentialStatus::Expired | CredentialStatus::Pending
                    if verdict == VerificationStatus::Valid =>
                {
                    verdict = VerificationStatus::Expired;
                    detail = format!("credential {credential_id} is not currently valid");
                }
                _ => {}
            }
        }

        Ok(VerificationResult {
            status: verdict,
            disclosed_claims,
            holder_id: Some(presentation.holder_id),
            detail,
            checked_at: Utc::now(),
        })
    }
}

fn structural_defect(presentation: &VerifiablePresentation) -> Option<String> {
    if presentation.holder_id.is_empty() {
        return Some("presentation has no holder".to_string());
    }
    if presentation.nonce.is_empty() {
        return Some("presentation has no nonce".to_string());
    }
    if presentation.proof.is_none() {
        return Some("presentation has no proof".to_string());
    }
    if presentation.disclosed_claims.is_empty() {
        return Some("presentation discloses no claims".to_string());
    }
    if presentation.credential_refs.is_empty() {
        return Some("presentation references no credentials".to_string());
    }
    None
}

fn invalid_result(detail: String) -> VerificationResult {
    VerificationResult {
        status: VerificationStatus::Invalid,
        disclosed_claims: HashMap::new(),
        holder_id: None,
        detail,
        checked_at: Utc::now(),
    }
}
