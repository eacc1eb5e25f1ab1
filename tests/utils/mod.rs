//! Shared test fixtures: an in-memory provider with call recording.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use credvault_wallet::provider::{
    AgentResponse, ConsentGateway, IdentityGateway, ProofGenerator, SecureStore, StubProof,
    UserAgent, WalletGateway,
};
use credvault_wallet::types::{
    CallbackParams, ConsentGrant, CredentialOffer, CredentialRequest, CredentialStatus,
    IssuerMetadata, Proof, StoredCredential, SubmissionOutcome, TokenRequest, TokenResponse,
    VerifiablePresentation, VerificationEvent,
};
use credvault_wallet::ClientConfig;
use serde_json::Value;

pub const HOLDER: &str = "holder-001";
pub const ISSUER: &str = "gov-issuer";
pub const REDIRECT_URI: &str = "credvault://auth/callback";

/// How the mock user agent resolves an authorization attempt.
#[derive(Clone, Debug)]
pub enum AgentScript {
    /// Complete sign-in, echoing the state from the authorization URL.
    Complete { code: String },

    /// Complete sign-in but echo a different state.
    TamperState { code: String, state: String },

    /// Dismiss the agent.
    Cancel,
}

#[derive(Default)]
struct Recorded {
    secure: HashMap<String, String>,
    token_calls: usize,
    offer_calls: usize,
    issue_calls: usize,
    list_calls: usize,
    submit_calls: usize,
    consents_recorded: Vec<ConsentGrant>,
    consents_revoked: Vec<String>,
    verification_events: Vec<VerificationEvent>,
    issued: Vec<CredentialRequest>,
}

struct Config {
    agent: AgentScript,
    offer: Option<CredentialOffer>,
    credentials: Vec<StoredCredential>,
    statuses: HashMap<String, CredentialStatus>,
    exchange_fails: bool,
    submit_fails: bool,
}

/// An in-memory provider recording every gateway call.
#[derive(Clone)]
pub struct MockProvider {
    recorded: Arc<Mutex<Recorded>>,
    config: Arc<Mutex<Config>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            recorded: Arc::new(Mutex::new(Recorded::default())),
            config: Arc::new(Mutex::new(Config {
                agent: AgentScript::Complete { code: "abc123".to_string() },
                offer: None,
                credentials: Vec::new(),
                statuses: HashMap::new(),
                exchange_fails: false,
                submit_fails: false,
            })),
        }
    }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().expect("lock should not be poisoned")
    }

    fn cfg(&self) -> MutexGuard<'_, Config> {
        self.config.lock().expect("lock should not be poisoned")
    }

    pub fn script_agent(&self, script: AgentScript) {
        self.cfg().agent = script;
    }

    pub fn set_offer(&self, offer: CredentialOffer) {
        self.cfg().offer = Some(offer);
    }

    pub fn add_credential(&self, credential: StoredCredential) {
        self.cfg().credentials.push(credential);
    }

    pub fn set_credential_status(&self, credential_id: &str, status: CredentialStatus) {
        self.cfg().statuses.insert(credential_id.to_string(), status);
    }

    pub fn fail_exchange(&self) {
        self.cfg().exchange_fails = true;
    }

    pub fn fail_submit(&self) {
        self.cfg().submit_fails = true;
    }

    pub fn token_calls(&self) -> usize {
        self.recorded().token_calls
    }

    pub fn offer_calls(&self) -> usize {
        self.recorded().offer_calls
    }

    pub fn issue_calls(&self) -> usize {
        self.recorded().issue_calls
    }

    pub fn submit_calls(&self) -> usize {
        self.recorded().submit_calls
    }

    pub fn consents_recorded(&self) -> Vec<ConsentGrant> {
        self.recorded().consents_recorded.clone()
    }

    pub fn consents_revoked(&self) -> Vec<String> {
        self.recorded().consents_revoked.clone()
    }

    pub fn verification_events(&self) -> Vec<VerificationEvent> {
        self.recorded().verification_events.clone()
    }

    pub fn issued_requests(&self) -> Vec<CredentialRequest> {
        self.recorded().issued.clone()
    }

    pub fn stored_value(&self, key: &str) -> Option<String> {
        self.recorded().secure.get(key).cloned()
    }

    /// Seed a valid token set as a completed sign-in would.
    pub fn seed_tokens(&self) {
        let mut recorded = self.recorded();
        recorded.secure.insert("access_token".to_string(), "seeded-token".to_string());
        recorded
            .secure
            .insert("token_expiry".to_string(), (Utc::now() + Duration::hours(1)).to_rfc3339());
    }

    /// Seed a token set whose expiry has already passed.
    pub fn seed_expired_tokens(&self) {
        let mut recorded = self.recorded();
        recorded.secure.insert("access_token".to_string(), "stale-token".to_string());
        recorded
            .secure
            .insert("token_expiry".to_string(), (Utc::now() - Duration::hours(1)).to_rfc3339());
    }
}

impl SecureStore for MockProvider {
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.recorded().secure.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.recorded().secure.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.recorded().secure.remove(key);
        Ok(())
    }
}

impl UserAgent for MockProvider {
    async fn authenticate(
        &self, authorization_url: &str, _redirect_uri: &str,
    ) -> Result<AgentResponse> {
        let script = self.cfg().agent.clone();
        match script {
            AgentScript::Complete { code } => {
                let url = url::Url::parse(authorization_url)?;
                let state = url
                    .query_pairs()
                    .find(|(k, _)| k == "state")
                    .map(|(_, v)| v.to_string())
                    .ok_or_else(|| anyhow!("authorization url has no state"))?;
                Ok(AgentResponse::Callback(CallbackParams { code, state }))
            }
            AgentScript::TamperState { code, state } => {
                Ok(AgentResponse::Callback(CallbackParams { code, state }))
            }
            AgentScript::Cancel => Ok(AgentResponse::Cancelled),
        }
    }
}

impl IdentityGateway for MockProvider {
    async fn issuer_metadata(&self, issuer_id: &str) -> Result<IssuerMetadata> {
        Ok(IssuerMetadata {
            issuer_id: issuer_id.to_string(),
            issuer_name: Some("Government Registry".to_string()),
            authorization_endpoint: "https://identity.credvault.example/authorize".to_string(),
            token_endpoint: "https://identity.credvault.example/token".to_string(),
            credential_endpoint: "https://wallet.credvault.example/credentials".to_string(),
            client_id: "credvault-mobile".to_string(),
            supported_credential_types: Some(vec!["NationalID".to_string()]),
        })
    }

    async fn exchange_token(
        &self, _token_endpoint: &str, request: &TokenRequest,
    ) -> Result<TokenResponse> {
        self.recorded().token_calls += 1;
        if self.cfg().exchange_fails {
            return Err(anyhow!("token endpoint unavailable"));
        }
        if request.code_verifier.is_empty() {
            return Err(anyhow!("missing code verifier"));
        }
        Ok(TokenResponse {
            access_token: format!("token-for-{}", request.code),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
            refresh_token: Some("refresh-1".to_string()),
            scope: None,
        })
    }
}

impl WalletGateway for MockProvider {
    async fn credential_offer(
        &self, _access_token: &str, _issuer_id: &str, _credential_type: &str,
    ) -> Result<CredentialOffer> {
        self.recorded().offer_calls += 1;
        self.cfg().offer.clone().ok_or_else(|| anyhow!("no offer available"))
    }

    async fn issue_credential(
        &self, _access_token: &str, request: &CredentialRequest,
    ) -> Result<StoredCredential> {
        {
            let mut recorded = self.recorded();
            recorded.issue_calls += 1;
            recorded.issued.push(request.clone());
        }
        Ok(StoredCredential {
            id: "cred-001".to_string(),
            credential_type: request.credential_type.clone(),
            issuer: request.issuer.clone(),
            issuer_id: Some(request.issuer_id.clone()),
            holder_id: request.holder_id.clone(),
            claims: request.claims.clone(),
            status: CredentialStatus::Active,
            issued_at: request.issued_at,
            expires_at: request.expires_at,
        })
    }

    async fn list_credentials(
        &self, _access_token: &str, holder_id: &str,
    ) -> Result<Vec<StoredCredential>> {
        self.recorded().list_calls += 1;
        Ok(self.cfg().credentials.iter().filter(|c| c.holder_id == holder_id).cloned().collect())
    }

    async fn credential_status(&self, credential_id: &str) -> Result<CredentialStatus> {
        Ok(self.cfg().statuses.get(credential_id).copied().unwrap_or(CredentialStatus::Active))
    }

    async fn submit_presentation(
        &self, _access_token: &str, _presentation: &VerifiablePresentation,
    ) -> Result<SubmissionOutcome> {
        self.recorded().submit_calls += 1;
        if self.cfg().submit_fails {
            return Err(anyhow!("verifier endpoint unavailable"));
        }
        Ok(SubmissionOutcome { accepted: true, message: Some("presentation accepted".to_string()) })
    }

    async fn record_verification(&self, event: &VerificationEvent) -> Result<()> {
        self.recorded().verification_events.push(event.clone());
        Ok(())
    }
}

impl ConsentGateway for MockProvider {
    async fn record_consent(&self, grant: &ConsentGrant) -> Result<()> {
        self.recorded().consents_recorded.push(grant.clone());
        Ok(())
    }

    async fn revoke_consent(&self, grant_id: &str) -> Result<()> {
        self.recorded().consents_revoked.push(grant_id.to_string());
        Ok(())
    }
}

impl ProofGenerator for MockProvider {
    async fn prove(
        &self, holder_id: &str, claims: &HashMap<String, Value>, nonce: &str,
    ) -> Result<Proof> {
        StubProof.prove(holder_id, claims, nonce).await
    }
}

/// Standard client configuration for tests.
pub fn config() -> ClientConfig {
    ClientConfig {
        holder_id: HOLDER.to_string(),
        redirect_uri: REDIRECT_URI.to_string(),
        ..ClientConfig::default()
    }
}

/// An active credential holding the given claims.
pub fn credential(id: &str, claims: &[(&str, &str)]) -> StoredCredential {
    StoredCredential {
        id: id.to_string(),
        credential_type: "NationalID".to_string(),
        issuer: "Government Registry".to_string(),
        issuer_id: Some(ISSUER.to_string()),
        holder_id: HOLDER.to_string(),
        claims: claims.iter().map(|(k, v)| ((*k).to_string(), Value::from(*v))).collect(),
        status: CredentialStatus::Active,
        issued_at: Utc::now(),
        expires_at: Some(Utc::now() + Duration::days(365)),
    }
}

/// A standard offer for the holder.
pub fn offer(claims: &[(&str, &str)]) -> CredentialOffer {
    CredentialOffer {
        credential_type: "NationalID".to_string(),
        issuer_id: ISSUER.to_string(),
        issuer_name: "Government Registry".to_string(),
        subject_id: Some(HOLDER.to_string()),
        claims: claims.iter().map(|(k, v)| ((*k).to_string(), Value::from(*v))).collect(),
        schema_id: Some("schema:national-id:v1".to_string()),
        expiration_date: Some(Utc::now() + Duration::days(365)),
    }
}
