//! # Authorization
//!
//! The authorization-code + PKCE flow against the identity service. One
//! flow instance drives one sign-in attempt end to end: parameter
//! generation, the user-agent round trip, the callback state check, and the
//! token exchange. Transient PKCE material is removed on every exit path;
//! durable tokens are written only after a successful exchange and are never
//! touched by cancellation or failure.

use anyhow::Context as _;
use chrono::Utc;
use tracing::instrument;
use url::Url;

use crate::error::invalid;
use crate::provider::{AgentResponse, Listener, Provider};
use crate::store::TokenStore;
use crate::types::{IssuerMetadata, TokenRequest, TokenSet, AUTHORIZATION_CODE};
use crate::{generate, ClientConfig, Error, Result};

/// Progress of an authorization attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Status {
    /// No attempt in flight.
    #[default]
    Idle,

    /// PKCE parameters generated and stashed.
    ParamsGenerated,

    /// The user agent has been opened with the authorization URL.
    AwaitingUserAgent,

    /// The agent returned callback parameters; not yet validated.
    CallbackReceived,

    /// The state nonce matched; the token exchange is in flight.
    Exchanging,

    /// Tokens stored. Terminal.
    Authenticated,

    /// The user dismissed the agent. Terminal.
    Cancelled,

    /// The attempt failed. Terminal.
    Failed(String),
}

/// A single sign-in attempt.
pub struct AuthorizationFlow<P: Provider> {
    provider: P,
    config: ClientConfig,
    id: String,
    status: Status,
    listener: Option<Listener<Status>>,
}

impl<P: Provider> AuthorizationFlow<P> {
    /// Create a flow for one attempt.
    pub fn new(provider: P, config: ClientConfig) -> Self {
        Self {
            provider,
            config,
            id: uuid::Uuid::new_v4().to_string(),
            status: Status::Idle,
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

    fn set_status(&mut self, status: Status) {
        self.status = status;
        if let Some(listener) = &self.listener {
            listener.on_status(&self.id, &self.status);
        }
    }

    /// Run the attempt to completion, returning the stored token set.
    ///
    /// Exactly one attempt may be in flight per store: any stale PKCE
    /// material from an abandoned attempt is purged before this one starts,
    /// and this attempt's material is purged again on every exit path.
    ///
    /// # Errors
    ///
    /// `Cancelled` when the user dismisses the agent, `CsrfMismatch` when
    /// the echoed state differs from the one sent (no token request is made),
    /// and `NetworkOrServer`/`Validation` for transport and protocol
    /// failures.
    #[instrument(skip(self), fields(flow = %self.id))]
    pub async fn authorize(&mut self, issuer_id: &str, credential_type: &str) -> Result<TokenSet> {
        let outcome = self.run(issuer_id, credential_type).await;

        // every exit path, success included
        if let Err(e) = self.provider.purge_pkce().await {
            tracing::error!("failed to purge transient authorization state: {e}");
        }

        match &outcome {
            Ok(_) => self.set_status(Status::Authenticated),
            Err(Error::Cancelled) => self.set_status(Status::Cancelled),
            Err(e) => self.set_status(Status::Failed(e.to_string())),
        }
        outcome
    }

    async fn run(&mut self, issuer_id: &str, credential_type: &str) -> Result<TokenSet> {
        // discard any stale attempt
        self.provider.purge_pkce().await.context("purging stale authorization state")?;

        let metadata =
            self.provider.issuer_metadata(issuer_id).await.context("fetching issuer metadata")?;

        let pkce = generate::pkce()?;
        self.provider
            .stash_pkce(&pkce.code_verifier, &pkce.state)
            .await
            .context("stashing authorization state")?;
        self.set_status(Status::ParamsGenerated);

        let auth_url = self.authorization_url(&metadata, issuer_id, credential_type, &pkce)?;

        self.set_status(Status::AwaitingUserAgent);
        let response = self
            .provider
            .authenticate(auth_url.as_str(), &self.config.redirect_uri)
            .await
            .context("opening user agent")?;

        let callback = match response {
            AgentResponse::Callback(params) => params,
            AgentResponse::Cancelled => return Err(Error::Cancelled),
        };
        self.set_status(Status::CallbackReceived);

        // the callback must belong to this attempt
        let Some(stash) = self.provider.stashed_pkce().await? else {
            return Err(invalid!("no authorization attempt in flight"));
        };
        if callback.state != stash.state {
            tracing::error!("state nonce mismatch on authorization callback");
            return Err(Error::CsrfMismatch("state nonce does not match".to_string()));
        }

        self.set_status(Status::Exchanging);
        let request = TokenRequest {
            grant_type: AUTHORIZATION_CODE.to_string(),
            code: callback.code,
            redirect_uri: self.config.redirect_uri.clone(),
            client_id: metadata.client_id.clone(),
            code_verifier: stash.code_verifier,
        };
        let response = self
            .provider
            .exchange_token(&metadata.token_endpoint, &request)
            .await
            .context("exchanging authorization code")?;

        let tokens = response.into_token_set(Utc::now());
        self.provider.save_tokens(&tokens).await.context("saving tokens")?;

        Ok(tokens)
    }

    fn authorization_url(
        &self, metadata: &IssuerMetadata, issuer_id: &str, credential_type: &str,
        pkce: &crate::types::PkceParameters,
    ) -> Result<Url> {
        let mut url = Url::parse(&metadata.authorization_endpoint)
            .map_err(|e| invalid!("invalid authorization endpoint: {e}"))?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &metadata.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scope)
            .append_pair("state", &pkce.state)
            .append_pair("code_challenge", &pkce.code_challenge)
            .append_pair("code_challenge_method", &pkce.code_challenge_method)
            .append_pair("credential_type", credential_type)
            .append_pair("issuer_id", issuer_id);

        Ok(url)
    }
}
