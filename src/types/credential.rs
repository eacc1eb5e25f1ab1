//! # Credential Types
//!
//! Types for credential offers, issuance requests, and credentials held in
//! the wallet.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A credential offer from an issuer, presented to the holder for consent.
///
/// Consumed once by the accept step. If issuance fails the offer is
/// discarded and a fresh offer must be fetched.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialOffer {
    /// Type of credential on offer, e.g. `NationalID`.
    pub credential_type: String,

    /// Issuer identifier.
    pub issuer_id: String,

    /// Display name of the issuer.
    pub issuer_name: String,

    /// Subject the credential will be issued to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,

    /// Claims the credential will attest to.
    pub claims: HashMap<String, Value>,

    /// Schema the credential conforms to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,

    /// Expiry of the credential, if it expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
}

/// An issuance request submitted to the wallet credential endpoint on
/// accept.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CredentialRequest {
    /// Credential type.
    #[serde(rename = "type")]
    pub credential_type: String,

    /// Subject of the credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Issuer display name.
    pub issuer: String,

    /// Issuer identifier.
    pub issuer_id: String,

    /// Holder the credential is issued to.
    pub holder_id: String,

    /// Schema identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,

    /// Claims carried by the credential. Always the full set from the
    /// accepted offer.
    pub claims: HashMap<String, Value>,

    /// Time of issuance.
    pub issued_at: DateTime<Utc>,

    /// Expiry, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Lifecycle status of a credential.
///
/// Transitions are one-way once `Revoked`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum CredentialStatus {
    /// The credential is active and usable.
    #[default]
    Active,

    /// The credential has passed its expiry.
    Expired,

    /// The credential has been revoked by the issuer. Terminal.
    Revoked,

    /// The credential is temporarily suspended.
    Suspended,

    /// Issuance has been requested but not finalised.
    Pending,
}

/// A credential held in the wallet.
///
/// Owned by the wallet backend; the client holds a read-through cache.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct StoredCredential {
    /// Unique credential identifier.
    pub id: String,

    /// Credential type.
    #[serde(rename = "type")]
    pub credential_type: String,

    /// Issuer display name.
    pub issuer: String,

    /// Issuer identifier, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_id: Option<String>,

    /// Holder the credential was issued to.
    pub holder_id: String,

    /// Attested claims.
    pub claims: HashMap<String, Value>,

    /// Lifecycle status.
    pub status: CredentialStatus,

    /// Time of issuance.
    pub issued_at: DateTime<Utc>,

    /// Expiry, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredCredential {
    /// Whether the credential has passed its expiry date.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= Utc::now())
    }

    /// Whether the credential can be presented: active and not past expiry.
    #[must_use]
    pub fn is_presentable(&self) -> bool {
        self.status == CredentialStatus::Active && !self.is_expired()
    }
}
