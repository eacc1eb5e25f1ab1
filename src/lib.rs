//! # `CredVault` Wallet
//!
//! Flow engine for the `CredVault` wallet: OAuth authorization-code + PKCE
//! sign-in, credential issuance, selective-disclosure presentation, and
//! verifier-side verification.
//!
//! The engine is transport and platform agnostic. Hosts implement the
//! [`provider`] traits (secure storage, system user agent, backend
//! gateways) and drive the flows in [`authorization`], [`issuance`],
//! [`presentation`], and [`verification`]. The [`http`] module provides a
//! ready-made gateway over HTTP.

pub mod authorization;
mod error;
pub mod generate;
pub mod http;
pub mod issuance;
pub mod presentation;
pub mod provider;
pub mod store;
pub mod types;
pub mod verification;

use std::time::Duration;

pub use self::error::Error;

/// Result type for wallet flows.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Host configuration shared by the flows.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Identifier of the holder the wallet acts for.
    pub holder_id: String,

    /// Redirect URI registered for the wallet client.
    pub redirect_uri: String,

    /// OAuth scope requested at sign-in.
    pub scope: String,

    /// Per-request timeout for backend calls.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            holder_id: String::new(),
            redirect_uri: "credvault://auth/callback".to_string(),
            scope: "openid credentials".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}
