//! # Presentation
//!
//! The holder-side presentation flow: parse a verifier's request, match the
//! requested claims against the wallet's credentials, let the holder choose
//! what to disclose, and on consent assemble and submit a presentation
//! carrying only the disclosed claims. Required claims cannot be withheld;
//! a request whose required claims cannot all be satisfied never reaches
//! submission.

use std::collections::HashMap;

use anyhow::Context as _;
use serde_json::Value;
use tracing::instrument;

use crate::error::invalid;
use crate::provider::{Listener, Provider};
use crate::store::TokenStore;
use crate::types::{
    ClaimMatch, ConsentGrant, ConsentRequest, Disclosure, PresentationRequest, RequestedClaim,
    SubmissionOutcome, VerifiablePresentation,
};
use crate::{generate, ClientConfig, Error, Result};

/// Progress of a presentation flow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Status {
    /// No request held.
    #[default]
    Idle,

    /// A verifier request has been parsed.
    RequestReceived,

    /// The request has been matched against the wallet's credentials.
    Matched,

    /// The disclosure set is fixed; awaiting the holder's consent.
    ConsentPending,

    /// Consent recorded; the presentation is being assembled and submitted.
    Presenting,

    /// The verifier accepted the presentation. Terminal.
    Submitted,

    /// The holder declined. Terminal.
    Denied,

    /// The flow failed. Terminal.
    Failed(String),
}

/// A single presentation flow.
pub struct PresentationFlow<P: Provider> {
    provider: P,
    config: ClientConfig,
    id: String,
    status: Status,
    request: Option<PresentationRequest>,
    matches: Vec<ClaimMatch>,
    listener: Option<Listener<Status>>,
}

impl<P: Provider> PresentationFlow<P> {
    /// Create a flow.
    pub fn new(provider: P, config: ClientConfig) -> Self {
        Self {
            provider,
            config,
            id: uuid::Uuid::new_v4().to_string(),
            status: Status::Idle,
            request: None,
            matches: Vec::new(),
            listener: None,
        }
    }

    /// Attach a status listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Listener<Status>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// The flow identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> &Status {
        &self.status
    }

    /// The per-claim matches, once the request has been processed.
    #[must_use]
    pub fn matches(&self) -> &[ClaimMatch] {
        &self.matches
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
        if let Some(listener) = &self.listener {
            listener.on_status(&self.id, &self.status);
        }
    }

    async fn access_token(&self) -> Result<String> {
        let Some(tokens) = self.provider.tokens().await? else {
            return Err(Error::Unauthenticated("no access token stored".to_string()));
        };
        if tokens.is_expired() {
            return Err(Error::Unauthenticated("access token has expired".to_string()));
        }
        Ok(tokens.access_token)
    }

    /// Parse a raw verifier payload and match it against the wallet's
    /// credentials.
    ///
    /// Accepts either the wallet's native request shape or an `OpenID4VP`
    /// authorization request carrying a presentation definition; anything
    /// else falls back to a generic identity request. Matched required
    /// claims are locked to disclosure; optional claims start from their
    /// `share_by_default` flag.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` when no valid access token is stored.
    #[instrument(skip(self, raw), fields(flow = %self.id))]
    pub async fn process_request(&mut self, raw: &str) -> Result<&[ClaimMatch]> {
        let request = parse_request(raw);
        self.set_status(Status::RequestReceived);

        let token = match self.access_token().await {
            Ok(token) => token,
            Err(e) => {
                self.set_status(Status::Failed(e.to_string()));
                return Err(e);
            }
        };
        let credentials = match self
            .provider
            .list_credentials(&token, &self.config.holder_id)
            .await
            .context("listing credentials for matching")
        {
            Ok(credentials) => credentials,
            Err(e) => {
                self.set_status(Status::Failed(e.to_string()));
                return Err(e.into());
            }
        };

        let mut matches = Vec::with_capacity(request.requested_claims.len());
        for claim in &request.requested_claims {
            let found = credentials
                .iter()
                .filter(|c| c.is_presentable())
                .find_map(|c| c.claims.get(&claim.name).map(|v| (c.id.clone(), v.clone())));

            let (credential_id, value) = match found {
                Some((id, value)) => (Some(id), Some(value)),
                None => (None, None),
            };
            let will_share = if claim.required {
                value.is_some()
            } else {
                value.is_some() && claim.share_by_default
            };

            matches.push(ClaimMatch { claim: claim.clone(), credential_id, value, will_share });
        }

        self.request = Some(request);
        self.matches = matches;
        self.set_status(Status::Matched);

        Ok(&self.matches)
    }

    /// Set whether an optional claim will be disclosed.
    ///
    /// # Errors
    ///
    /// `Validation` for an unknown claim, a claim with no matched value, or
    /// an attempt to withhold a required claim.
    pub fn set_share(&mut self, claim_name: &str, share: bool) -> Result<()> {
        let Some(m) = self.matches.iter_mut().find(|m| m.claim.name == claim_name) else {
            return Err(invalid!("claim {claim_name} was not requested"));
        };
        if m.claim.required && !share {
            return Err(invalid!("claim {claim_name} is required and cannot be withheld"));
        }
        if !m.is_available() {
            return Err(invalid!("claim {claim_name} has no matched value"));
        }
        m.will_share = share;
        Ok(())
    }

    /// The consent prompt for the current disclosure set.
    ///
    /// Only available while a matched request awaits a decision, and only
    /// when every required claim has a matched value.
    ///
    /// # Errors
    ///
    /// `Validation` when no matched request is in flight or a required claim
    /// is unavailable.
    pub fn consent_request(&mut self) -> Result<ConsentRequest> {
        if !matches!(self.status, Status::Matched | Status::ConsentPending) {
            return Err(invalid!("no matched presentation request in flight"));
        }
        if let Some(missing) = self.matches.iter().find(|m| m.claim.required && !m.is_available())
        {
            return Err(invalid!(
                "required claim {} is not available in the wallet",
                missing.claim.name
            ));
        }
        let Some(request) = &self.request else {
            return Err(invalid!("no presentation request in flight"));
        };

        let consent = ConsentRequest {
            verifier_id: request.verifier_id.clone(),
            verifier_name: request.verifier_name.clone(),
            purpose: request.purpose.clone(),
            claims: self
                .matches
                .iter()
                .filter(|m| m.will_share)
                .map(|m| m.claim.name.clone())
                .collect(),
        };

        self.set_status(Status::ConsentPending);
        Ok(consent)
    }

    /// Resolve the holder's consent decision and, on approval, assemble and
    /// submit the presentation.
    ///
    /// The consent grant is recorded before submission and revoked
    /// (best effort) if submission fails. Each attempt carries a fresh
    /// nonce. The presentation discloses exactly the claims marked for
    /// sharing and nothing else.
    ///
    /// # Errors
    ///
    /// `ConsentDenied` when declined, `Validation` when no matched request
    /// awaits a decision (the terminal `Submitted`, `Denied`, and `Failed`
    /// states included) or a required claim has no matched value (checked
    /// before any submission), `Unauthenticated` or `NetworkOrServer` for
    /// token and transport failures.
    #[instrument(skip(self), fields(flow = %self.id))]
    pub async fn present(&mut self, consented: bool) -> Result<SubmissionOutcome> {
        if !matches!(self.status, Status::Matched | Status::ConsentPending) {
            return Err(invalid!("no presentation awaiting a consent decision"));
        }

        let outcome = self.submit(consented).await;
        match &outcome {
            Ok(_) => self.set_status(Status::Submitted),
            Err(Error::ConsentDenied(_)) => self.set_status(Status::Denied),
            Err(e) => self.set_status(Status::Failed(e.to_string())),
        }
        outcome
    }

    async fn submit(&mut self, consented: bool) -> Result<SubmissionOutcome> {
        let Some(request) = self.request.clone() else {
            return Err(invalid!("no presentation request in flight"));
        };

        if !consented {
            return Err(Error::ConsentDenied("holder declined the presentation".to_string()));
        }

        if let Some(missing) = self.matches.iter().find(|m| m.claim.required && !m.is_available())
        {
            return Err(invalid!(
                "required claim {} is not available in the wallet",
                missing.claim.name
            ));
        }

        let token = self.access_token().await?;

        let disclosures: Vec<Disclosure> = self
            .matches
            .iter()
            .filter(|m| m.will_share && m.is_available())
            .filter_map(|m| {
                let value = m.value.clone()?;
                let credential_id = m.credential_id.clone()?;
                Some(Disclosure { name: m.claim.name.clone(), value, credential_id })
            })
            .collect();

        let grant = ConsentGrant::new(
            &self.config.holder_id,
            &request.verifier_id,
            disclosures.iter().map(|d| d.name.clone()).collect(),
            chrono::Utc::now(),
        );
        self.provider.record_consent(&grant).await.context("recording consent")?;
        self.set_status(Status::Presenting);

        let nonce = generate::nonce();
        let claim_map: HashMap<String, Value> =
            disclosures.iter().map(|d| (d.name.clone(), d.value.clone())).collect();
        let proof = self
            .provider
            .prove(&self.config.holder_id, &claim_map, &nonce)
            .await
            .context("generating presentation proof")?;

        let mut credential_refs: Vec<String> =
            disclosures.iter().map(|d| d.credential_id.clone()).collect();
        credential_refs.sort();
        credential_refs.dedup();

        let presentation = VerifiablePresentation {
            id: uuid::Uuid::new_v4().to_string(),
            holder_id: self.config.holder_id.clone(),
            verifier_id: request.verifier_id.clone(),
            credential_refs,
            disclosed_claims: disclosures,
            nonce,
            created_at: chrono::Utc::now(),
            proof: Some(proof),
        };

        let submitted = self
            .provider
            .submit_presentation(&token, &presentation)
            .await
            .context("submitting presentation");
        match submitted {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                // the grant covers a presentation that never landed
                if let Err(revoke_err) = self.provider.revoke_consent(&grant.id).await {
                    tracing::error!("failed to revoke consent after submit failure: {revoke_err}");
                }
                Err(e.into())
            }
        }
    }
}

/// Parse a raw verifier payload into a [`PresentationRequest`].
///
/// Never fails: payloads that fit neither the native shape nor an
/// `OpenID4VP` authorization request fall back to a generic identity
/// request, with the defect logged.
#[must_use]
pub fn parse_request(raw: &str) -> PresentationRequest {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("presentation request is not JSON, using generic request: {e}");
            return generic_request();
        }
    };

    // native shape first
    if value.get("verifier_id").is_some() && value.get("requested_claims").is_some() {
        match serde_json::from_value(value) {
            Ok(request) => return request,
            Err(e) => {
                tracing::warn!("malformed presentation request, using generic request: {e}");
                return generic_request();
            }
        }
    }

    // OpenID4VP authorization request with a presentation definition
    if let Some(request) = parse_openid4vp(&value) {
        return request;
    }

    tracing::warn!("unrecognised presentation request shape, using generic request");
    generic_request()
}

fn parse_openid4vp(value: &Value) -> Option<PresentationRequest> {
    let definition = value.get("presentation_definition")?;
    let verifier_id = value.get("client_id").and_then(Value::as_str)?.to_string();
    let verifier_name = value.get("client_name").and_then(Value::as_str).map(ToString::to_string);

    let mut requested_claims = Vec::new();
    let mut purpose = None;

    let descriptors = definition.get("input_descriptors").and_then(Value::as_array)?;
    for descriptor in descriptors {
        if purpose.is_none() {
            purpose = descriptor.get("purpose").and_then(Value::as_str).map(ToString::to_string);
        }
        let Some(fields) = descriptor.pointer("/constraints/fields").and_then(Value::as_array)
        else {
            continue;
        };
        for field in fields {
            let Some(name) = field
                .get("path")
                .and_then(Value::as_array)
                .and_then(|paths| paths.first())
                .and_then(Value::as_str)
                .and_then(|path| path.rsplit(['.', '/']).next())
            else {
                continue;
            };
            let optional = field.get("optional").and_then(Value::as_bool).unwrap_or(false);
            requested_claims.push(RequestedClaim {
                name: name.to_string(),
                required: !optional,
                share_by_default: false,
            });
        }
    }

    if requested_claims.is_empty() {
        return None;
    }

    Some(PresentationRequest { verifier_id, verifier_name, requested_claims, purpose })
}

fn generic_request() -> PresentationRequest {
    PresentationRequest {
        verifier_id: "unknown-verifier".to_string(),
        verifier_name: None,
        requested_claims: vec![RequestedClaim::required("fullName")],
        purpose: Some("Identity verification".to_string()),
    }
}
