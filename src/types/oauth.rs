//! # OAuth Types
//!
//! Types used during the authorization-code (+ PKCE) round trip with the
//! identity provider.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The `authorization_code` grant type, as used in the token request body.
pub const AUTHORIZATION_CODE: &str = "authorization_code";

/// PKCE parameters for a single authorization attempt.
///
/// Created per attempt and discarded (success or failure) after the token
/// exchange or cancellation. The challenge is always the unpadded base64url
/// encoding of the SHA-256 digest of the verifier.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PkceParameters {
    /// The code verifier: 43–128 URL-safe characters, held locally and sent
    /// only with the token request.
    pub code_verifier: String,

    /// The code challenge sent with the authorization request.
    pub code_challenge: String,

    /// The challenge method. Always `S256`.
    pub code_challenge_method: String,

    /// Unique, single-use state nonce binding the callback to this attempt.
    pub state: String,
}

/// Token request body for exchanging an authorization code, as posted
/// (form-encoded) to the token endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TokenRequest {
    /// Always `authorization_code` for this flow.
    pub grant_type: String,

    /// The authorization code returned in the callback.
    pub code: String,

    /// Must match the `redirect_uri` sent with the authorization request.
    pub redirect_uri: String,

    /// Wallet client identifier.
    pub client_id: String,

    /// The PKCE code verifier (never the challenge).
    pub code_verifier: String,
}

/// Token endpoint response.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TokenResponse {
    /// The issued access token.
    pub access_token: String,

    /// Token type, typically `Bearer`.
    pub token_type: String,

    /// Lifetime of the access token in seconds.
    pub expires_in: i64,

    /// Optional refresh token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Granted scope, if narrower than requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Convert the response into a [`TokenSet`], resolving the relative
    /// expiry against the provided issue time.
    #[must_use]
    pub fn into_token_set(self, issued_at: DateTime<Utc>) -> TokenSet {
        TokenSet {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type,
            expires_at: issued_at + Duration::seconds(self.expires_in),
            scope: self.scope,
        }
    }
}

/// The set of tokens held after a successful exchange.
///
/// Owned exclusively by the token store: written after a successful exchange,
/// read by any flow needing authenticated calls, cleared on logout or
/// detected invalidity.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenSet {
    /// Bearer access token.
    pub access_token: String,

    /// Optional refresh token.
    pub refresh_token: Option<String>,

    /// Token type, typically `Bearer`.
    pub token_type: String,

    /// Absolute expiry of the access token.
    pub expires_at: DateTime<Utc>,

    /// Granted scope, if known.
    pub scope: Option<String>,
}

impl TokenSet {
    /// Whether the access token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Issuer metadata for the issuance flow. Immutable once fetched for a
/// session; re-fetchable.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct IssuerMetadata {
    /// Issuer identifier.
    pub issuer_id: String,

    /// Display name of the issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_name: Option<String>,

    /// OAuth authorization endpoint.
    pub authorization_endpoint: String,

    /// OAuth token endpoint.
    pub token_endpoint: String,

    /// Credential issuance endpoint.
    pub credential_endpoint: String,

    /// Client identifier registered for this wallet.
    pub client_id: String,

    /// Credential types the issuer supports, when advertised.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_credential_types: Option<Vec<String>>,
}

/// Parameters extracted from the authorization callback URL.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CallbackParams {
    /// The authorization code.
    pub code: String,

    /// The echoed state nonce. Must exactly equal the state sent with the
    /// authorization request.
    pub state: String,
}
