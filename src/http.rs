//! # HTTP Gateway
//!
//! A `reqwest`-based implementation of the gateway traits against the
//! backend's identity, wallet, and consent services. Requests are not
//! retried; callers decide whether to re-run a failed flow.

use anyhow::{anyhow, Result};
use http::StatusCode;
use url::Url;

use crate::provider::{ConsentGateway, IdentityGateway, WalletGateway};
use crate::types::{
    ConsentGrant, CredentialOffer, CredentialRequest, CredentialStatus, IssuerMetadata,
    StoredCredential, SubmissionOutcome, TokenRequest, TokenResponse, VerifiablePresentation,
    VerificationEvent,
};
use crate::Error;

/// Base URLs for the backend services.
#[derive(Clone, Debug)]
pub struct ServiceUrls {
    /// Identity service (OAuth endpoints, issuer metadata).
    pub identity: Url,

    /// Wallet service (offers, credentials, presentations).
    pub wallet: Url,

    /// Consent service.
    pub consent: Url,
}

/// Gateway to the backend services over HTTP.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: reqwest::Client,
    urls: ServiceUrls,
}

impl HttpGateway {
    /// Create a gateway with the given service URLs and per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(urls: ServiceUrls, timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, urls })
    }

    fn endpoint(base: &Url, path: &str) -> String {
        format!("{}/{path}", base.as_str().trim_end_matches('/'))
    }
}

/// Map an HTTP response status to a flow error.
///
/// 401 means the token was rejected, 5xx and transport failures are service
/// unavailability, and any other client error is a rejected request.
pub(crate) fn status_error(status: StatusCode, detail: &str) -> Error {
    if status == StatusCode::UNAUTHORIZED {
        Error::Unauthenticated(format!("backend rejected credentials: {detail}"))
    } else if status.is_server_error() {
        Error::NetworkOrServer(format!("service unavailable ({status}): {detail}"))
    } else {
        Error::Validation(format!("request rejected ({status}): {detail}"))
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
    let response = request.send().await.map_err(Error::from)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(anyhow!(status_error(status, &body)))
}

impl IdentityGateway for HttpGateway {
    async fn issuer_metadata(&self, issuer_id: &str) -> Result<IssuerMetadata> {
        let url = Self::endpoint(&self.urls.identity, &format!("issuers/{issuer_id}/metadata"));
        Ok(send(self.client.get(url)).await?.json().await?)
    }

    async fn exchange_token(
        &self, token_endpoint: &str, request: &TokenRequest,
    ) -> Result<TokenResponse> {
        Ok(send(self.client.post(token_endpoint).form(request)).await?.json().await?)
    }
}

impl WalletGateway for HttpGateway {
    async fn credential_offer(
        &self, access_token: &str, issuer_id: &str, credential_type: &str,
    ) -> Result<CredentialOffer> {
        let url = Self::endpoint(
            &self.urls.wallet,
            &format!("issuers/{issuer_id}/offers/{credential_type}"),
        );
        Ok(send(self.client.get(url).bearer_auth(access_token)).await?.json().await?)
    }

    async fn issue_credential(
        &self, access_token: &str, request: &CredentialRequest,
    ) -> Result<StoredCredential> {
        let url = Self::endpoint(&self.urls.wallet, "credentials");
        Ok(send(self.client.post(url).bearer_auth(access_token).json(request))
            .await?
            .json()
            .await?)
    }

    async fn list_credentials(
        &self, access_token: &str, holder_id: &str,
    ) -> Result<Vec<StoredCredential>> {
        let url = Self::endpoint(&self.urls.wallet, &format!("holders/{holder_id}/credentials"));
        Ok(send(self.client.get(url).bearer_auth(access_token)).await?.json().await?)
    }

    async fn credential_status(&self, credential_id: &str) -> Result<CredentialStatus> {
        let url = Self::endpoint(&self.urls.wallet, &format!("credentials/{credential_id}/status"));
        Ok(send(self.client.get(url)).await?.json().await?)
    }

    async fn submit_presentation(
        &self, access_token: &str, presentation: &VerifiablePresentation,
    ) -> Result<SubmissionOutcome> {
        let url = Self::endpoint(&self.urls.wallet, "presentations");
        Ok(send(self.client.post(url).bearer_auth(access_token).json(presentation))
            .await?
            .json()
            .await?)
    }

    async fn record_verification(&self, event: &VerificationEvent) -> Result<()> {
        let url = Self::endpoint(&self.urls.wallet, "verifications");
        send(self.client.post(url).json(event)).await?;
        Ok(())
    }
}

impl ConsentGateway for HttpGateway {
    async fn record_consent(&self, grant: &ConsentGrant) -> Result<()> {
        let url = Self::endpoint(&self.urls.consent, "consents");
        send(self.client.post(url).json(grant)).await?;
        Ok(())
    }

    async fn revoke_consent(&self, grant_id: &str) -> Result<()> {
        let url = Self::endpoint(&self.urls.consent, &format!("consents/{grant_id}"));
        send(self.client.delete(url)).await?;
        Ok(())
    }
}
