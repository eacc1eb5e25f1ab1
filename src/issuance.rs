//! # Issuance
//!
//! The holder-side issuance flow: fetch an offer from an issuer, put it to
//! the holder for consent, and on approval request the credential and hand
//! back the stored result. An offer is accepted at most once; a declined or
//! failed accept discards it and a fresh offer must be fetched.

use anyhow::Context as _;
use chrono::Utc;
use tracing::instrument;

use crate::error::invalid;
use crate::provider::{Listener, Provider};
use crate::store::TokenStore;
use crate::types::{
    CredentialOffer, CredentialRequest, CredentialStatus, IssuerMetadata, StoredCredential,
};
use crate::{ClientConfig, Error, Result};

/// Progress of an issuance flow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Status {
    /// No offer held.
    #[default]
    Idle,

    /// An offer has been fetched and awaits the holder's decision.
    Offered,

    /// The holder approved; the issuance request is in flight.
    Requested,

    /// The credential has been issued and stored. Terminal.
    Stored,

    /// The holder declined the offer. Terminal.
    Denied,

    /// The flow failed. Terminal.
    Failed(String),
}

/// A single issuance flow.
pub struct IssuanceFlow<P: Provider> {
    provider: P,
    config: ClientConfig,
    id: String,
    status: Status,
    offer: Option<CredentialOffer>,
    listener: Option<Listener<Status>>,
}

impl<P: Provider> IssuanceFlow<P> {
    /// Create a flow.
    pub fn new(provider: P, config: ClientConfig) -> Self {
        Self {
            provider,
            config,
            id: uuid::Uuid::new_v4().to_string(),
            status: Status::Idle,
            offer: None,
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

    /// The held offer, when one is awaiting a decision.
    #[must_use]
    pub const fn offer(&self) -> Option<&CredentialOffer> {
        self.offer.as_ref()
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

    /// Fetch issuer metadata. Idempotent; no token required.
    pub async fn issuer_metadata(&self, issuer_id: &str) -> Result<IssuerMetadata> {
        Ok(self.provider.issuer_metadata(issuer_id).await.context("fetching issuer metadata")?)
    }

    /// Fetch a credential offer for the authenticated holder and hold it for
    /// the consent decision.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` when no valid access token is stored.
    #[instrument(skip(self), fields(flow = %self.id))]
    pub async fn request_offer(
        &mut self, issuer_id: &str, credential_type: &str,
    ) -> Result<&CredentialOffer> {
        let token = self.access_token().await?;

        let offer = self
            .provider
            .credential_offer(&token, issuer_id, credential_type)
            .await
            .context("fetching credential offer");
        let offer = match offer {
            Ok(offer) => offer,
            Err(e) => {
                self.set_status(Status::Failed(e.to_string()));
                return Err(e.into());
            }
        };

        self.set_status(Status::Offered);
        let held = self.offer.insert(offer);

        Ok(held)
    }

    /// Resolve the held offer with the holder's consent decision.
    ///
    /// The offer is consumed by the decision, approved or not. When
    /// `consented` is false the flow stops with no network calls. On
    /// approval the issuance request is submitted with the offer's full
    /// claim set and the stored credential is returned.
    ///
    /// # Errors
    ///
    /// `ConsentDenied` when declined, `Validation` when no offer is held
    /// (including a second accept of the same offer), `Unauthenticated` when
    /// no valid token is stored.
    #[instrument(skip(self), fields(flow = %self.id))]
    pub async fn accept(&mut self, consented: bool) -> Result<StoredCredential> {
        // consumed whether the decision is approval or refusal
        let Some(offer) = self.offer.take() else {
            return Err(invalid!("no credential offer to accept"));
        };

        if !consented {
            self.set_status(Status::Denied);
            return Err(Error::ConsentDenied("holder declined the credential offer".to_string()));
        }

        let token = match self.access_token().await {
            Ok(token) => token,
            Err(e) => {
                self.set_status(Status::Failed(e.to_string()));
                return Err(e);
            }
        };
        self.set_status(Status::Requested);

        let request = CredentialRequest {
            credential_type: offer.credential_type,
            subject: offer.subject_id,
            issuer: offer.issuer_name,
            issuer_id: offer.issuer_id,
            holder_id: self.config.holder_id.clone(),
            schema_id: offer.schema_id,
            claims: offer.claims,
            issued_at: Utc::now(),
            expires_at: offer.expiration_date,
        };

        let credential =
            self.provider.issue_credential(&token, &request).await.context("issuing credential");
        match credential {
            Ok(credential) => {
                self.set_status(Status::Stored);
                Ok(credential)
            }
            Err(e) => {
                self.set_status(Status::Failed(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// List the holder's credentials, marking any past expiry.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` when no valid access token is stored.
    pub async fn credentials(&self) -> Result<Vec<StoredCredential>> {
        let token = self.access_token().await?;
        let mut credentials = self
            .provider
            .list_credentials(&token, &self.config.holder_id)
            .await
            .context("listing credentials")?;

        for credential in &mut credentials {
            if credential.status == CredentialStatus::Active && credential.is_expired() {
                credential.status = CredentialStatus::Expired;
            }
        }

        Ok(credentials)
    }

    /// Look up the current status of a credential.
    pub async fn refresh_status(&self, credential_id: &str) -> Result<CredentialStatus> {
        Ok(self
            .provider
            .credential_status(credential_id)
            .await
            .context("checking credential status")?)
    }
}
