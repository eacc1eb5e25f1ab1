//! # Presentation Types
//!
//! Types for presentation requests, selective disclosure, consent, and
//! verifier-side verification.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How long a consent grant remains valid before the presentation must be
/// re-consented.
pub const CONSENT_VALIDITY_MINUTES: i64 = 5;

/// A parsed presentation request from a verifier.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PresentationRequest {
    /// Verifier identifier.
    pub verifier_id: String,

    /// Display name of the verifier, when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifier_name: Option<String>,

    /// Claims the verifier is asking for.
    pub requested_claims: Vec<RequestedClaim>,

    /// Stated purpose of the request, when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

/// A single claim requested by a verifier.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RequestedClaim {
    /// Claim name, e.g. `fullName`.
    pub name: String,

    /// Whether the claim is required. Required claims cannot be withheld.
    #[serde(default = "default_true")]
    pub required: bool,

    /// Whether an optional claim is shared unless the holder opts out.
    #[serde(default)]
    pub share_by_default: bool,
}

const fn default_true() -> bool {
    true
}

impl RequestedClaim {
    /// A required claim.
    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self { name: name.into(), required: true, share_by_default: false }
    }

    /// An optional claim, hidden by default.
    #[must_use]
    pub fn optional(name: impl Into<String>) -> Self {
        Self { name: name.into(), required: false, share_by_default: false }
    }
}

/// The match of one requested claim against the wallet's credentials.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClaimMatch {
    /// The requested claim.
    pub claim: RequestedClaim,

    /// Identifier of the credential the claim was found in, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,

    /// The claim value, if found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Whether the claim will be disclosed. Locked to `true` for matched
    /// required claims.
    pub will_share: bool,
}

impl ClaimMatch {
    /// Whether a usable value was found for this claim.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.value.is_some()
    }
}

/// A disclosed claim within a presentation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Disclosure {
    /// Claim name.
    pub name: String,

    /// Disclosed value.
    pub value: Value,

    /// Credential the value was drawn from.
    pub credential_id: String,
}

/// A verifiable presentation assembled for submission to a verifier.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct VerifiablePresentation {
    /// Unique presentation identifier.
    pub id: String,

    /// Holder the presentation speaks for.
    pub holder_id: String,

    /// Verifier the presentation is addressed to.
    pub verifier_id: String,

    /// Identifiers of the credentials claims were drawn from.
    pub credential_refs: Vec<String>,

    /// The disclosed claims, and nothing else.
    pub disclosed_claims: Vec<Disclosure>,

    /// Fresh nonce for this presentation attempt.
    pub nonce: String,

    /// Time the presentation was created.
    pub created_at: DateTime<Utc>,

    /// Proof over the presentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

/// A proof envelope attached to a presentation.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Proof {
    /// Proof suite identifier.
    #[serde(rename = "type")]
    pub proof_type: String,

    /// Time the proof was created.
    pub created: DateTime<Utc>,

    /// Verification method reference.
    pub verification_method: String,

    /// Proof purpose, e.g. `authentication`.
    pub proof_purpose: String,

    /// The proof value.
    pub proof_value: String,
}

/// A pending consent decision put to the holder before a presentation is
/// submitted.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ConsentRequest {
    /// Verifier asking for the claims.
    pub verifier_id: String,

    /// Display name of the verifier, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifier_name: Option<String>,

    /// Stated purpose, when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    /// Names of the claims that will be disclosed if the holder approves.
    pub claims: Vec<String>,
}

/// A recorded grant of consent for one presentation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ConsentGrant {
    /// Grant identifier.
    pub id: String,

    /// Holder who granted consent.
    pub holder_id: String,

    /// Verifier consent was granted to.
    pub verifier_id: String,

    /// Claims the grant covers.
    pub claims: Vec<String>,

    /// Time the grant was made.
    pub granted_at: DateTime<Utc>,

    /// Time the grant lapses.
    pub expires_at: DateTime<Utc>,
}

impl ConsentGrant {
    /// Create a grant valid for [`CONSENT_VALIDITY_MINUTES`] from `granted_at`.
    #[must_use]
    pub fn new(
        holder_id: impl Into<String>, verifier_id: impl Into<String>, claims: Vec<String>,
        granted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            holder_id: holder_id.into(),
            verifier_id: verifier_id.into(),
            claims,
            granted_at,
            expires_at: granted_at + Duration::minutes(CONSENT_VALIDITY_MINUTES),
        }
    }

    /// Whether the grant has lapsed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Outcome reported by the verifier endpoint on submission.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SubmissionOutcome {
    /// Whether the verifier accepted the presentation.
    pub accepted: bool,

    /// Verifier-supplied message, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Verifier-side verdict on a scanned presentation.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum VerificationStatus {
    /// The presentation is well-formed and every referenced credential is in
    /// good standing.
    Valid,

    /// At least one referenced credential has been revoked.
    Revoked,

    /// At least one referenced credential has expired (and none revoked).
    Expired,

    /// The payload could not be parsed or fails structural checks.
    #[default]
    Invalid,
}

/// Structured result of verifying a presentation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct VerificationResult {
    /// Overall verdict.
    pub status: VerificationStatus,

    /// The disclosed claims, echoed for display. Empty when `Invalid`.
    pub disclosed_claims: HashMap<String, Value>,

    /// Holder the presentation speaks for, when parseable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_id: Option<String>,

    /// Human-readable detail on the verdict.
    pub detail: String,

    /// Time the check was performed.
    pub checked_at: DateTime<Utc>,
}

/// An audit event recorded after a verification check.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct VerificationEvent {
    /// Event identifier.
    pub id: String,

    /// Verifier that performed the check.
    pub verifier_id: String,

    /// Holder whose presentation was checked, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_id: Option<String>,

    /// Verdict reached.
    pub status: VerificationStatus,

    /// Names of the claims that were disclosed.
    pub claim_names: Vec<String>,

    /// Time of the check.
    pub checked_at: DateTime<Utc>,
}
