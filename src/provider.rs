//! # Provider
//!
//! Collaborator traits the host application implements: secure storage, the
//! system user agent, transport gateways to the backend services, proof
//! generation, and flow status listeners. The flows are written against
//! these traits only, so transport and platform concerns stay outside the
//! crate.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use crate::types::{
    ConsentGrant, CredentialOffer, CredentialRequest, CredentialStatus, IssuerMetadata,
    StoredCredential, SubmissionOutcome, TokenRequest, TokenResponse, VerifiablePresentation,
    VerificationEvent,
};

/// Provider is the top-level trait the flows are generic over.
///
/// A single type implements the sub-traits it needs; the blanket impl wires
/// it up as a `Provider`.
pub trait Provider:
    SecureStore + UserAgent + IdentityGateway + WalletGateway + ConsentGateway + ProofGenerator
{
}

impl<T> Provider for T where
    T: SecureStore + UserAgent + IdentityGateway + WalletGateway + ConsentGateway + ProofGenerator
{
}

/// Platform-provided encrypted key-value storage.
///
/// Values written here are assumed encrypted at rest by the platform.
/// Removal of an absent key is not an error.
pub trait SecureStore: Send + Sync {
    /// Store a value under `key`, replacing any existing value.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    /// Retrieve the value stored under `key`, if any.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Remove the value stored under `key`. Idempotent.
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

/// The outcome of handing an authorization URL to the system user agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentResponse {
    /// The agent returned to the redirect URI with callback parameters.
    Callback(crate::types::CallbackParams),

    /// The user dismissed the agent without completing sign-in.
    Cancelled,
}

/// The system user agent (browser tab or web view) used for interactive
/// sign-in.
pub trait UserAgent: Send + Sync {
    /// Open `authorization_url` and wait for the agent to either return to
    /// `redirect_uri` or be dismissed.
    fn authenticate(
        &self, authorization_url: &str, redirect_uri: &str,
    ) -> impl Future<Output = Result<AgentResponse>> + Send;
}

/// Gateway to the identity service (OAuth endpoints and issuer metadata).
pub trait IdentityGateway: Send + Sync {
    /// Fetch issuer metadata for `issuer_id`.
    fn issuer_metadata(
        &self, issuer_id: &str,
    ) -> impl Future<Output = Result<IssuerMetadata>> + Send;

    /// Exchange an authorization code (plus PKCE verifier) for tokens at
    /// `token_endpoint`.
    fn exchange_token(
        &self, token_endpoint: &str, request: &TokenRequest,
    ) -> impl Future<Output = Result<TokenResponse>> + Send;
}

/// Gateway to the wallet service (offers, issuance, credentials, and
/// presentation submission).
pub trait WalletGateway: Send + Sync {
    /// Fetch a credential offer of `credential_type` from `issuer_id` for the
    /// authenticated holder.
    fn credential_offer(
        &self, access_token: &str, issuer_id: &str, credential_type: &str,
    ) -> impl Future<Output = Result<CredentialOffer>> + Send;

    /// Submit an issuance request and receive the stored credential.
    fn issue_credential(
        &self, access_token: &str, request: &CredentialRequest,
    ) -> impl Future<Output = Result<StoredCredential>> + Send;

    /// List the holder's credentials.
    fn list_credentials(
        &self, access_token: &str, holder_id: &str,
    ) -> impl Future<Output = Result<Vec<StoredCredential>>> + Send;

    /// Look up the current status of a credential.
    fn credential_status(
        &self, credential_id: &str,
    ) -> impl Future<Output = Result<CredentialStatus>> + Send;

    /// Submit a presentation to the verifier endpoint.
    fn submit_presentation(
        &self, access_token: &str, presentation: &VerifiablePresentation,
    ) -> impl Future<Output = Result<SubmissionOutcome>> + Send;

    /// Record a verification event in the activity log.
    fn record_verification(
        &self, event: &VerificationEvent,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Gateway to the consent service.
pub trait ConsentGateway: Send + Sync {
    /// Record a consent grant.
    fn record_consent(&self, grant: &ConsentGrant) -> impl Future<Output = Result<()>> + Send;

    /// Revoke a previously recorded grant. Idempotent.
    fn revoke_consent(&self, grant_id: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Produces the proof attached to a presentation.
pub trait ProofGenerator: Send + Sync {
    /// Create a proof over the disclosed claims for `holder_id`, bound to
    /// `nonce`.
    fn prove(
        &self, holder_id: &str, claims: &HashMap<String, Value>, nonce: &str,
    ) -> impl Future<Output = Result<crate::types::Proof>> + Send;
}

/// A placeholder proof generator producing a structurally complete envelope
/// with no real signature.
#[derive(Clone, Copy, Debug, Default)]
pub struct StubProof;

impl ProofGenerator for StubProof {
    async fn prove(
        &self, holder_id: &str, claims: &HashMap<String, Value>, nonce: &str,
    ) -> Result<crate::types::Proof> {
        let digest_input = serde_json::to_string(claims)?;
        Ok(crate::types::Proof {
            proof_type: "Ed25519Signature2020".to_string(),
            created: chrono::Utc::now(),
            verification_method: format!("did:example:{holder_id}#key-1"),
            proof_purpose: "authentication".to_string(),
            proof_value: format!("stub:{nonce}:{}", digest_input.len()),
        })
    }
}

/// Receives status updates as a flow progresses. Dyn-compatible so hosts can
/// fan updates out to UI layers.
pub trait StatusListener<S>: Send + Sync {
    /// Called on every status transition of the flow identified by `flow_id`.
    fn on_status(&self, flow_id: &str, status: &S);
}

impl<S, F> StatusListener<S> for F
where
    F: Fn(&str, &S) + Send + Sync,
{
    fn on_status(&self, flow_id: &str, status: &S) {
        self(flow_id, status);
    }
}

/// A listener handle shared with a flow.
pub type Listener<S> = Arc<dyn StatusListener<S>>;
