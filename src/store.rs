//! # Token Store
//!
//! Durable token persistence and the transient PKCE stash, layered over the
//! raw [`SecureStore`]. Durable keys survive restarts; transient keys exist
//! only for the lifetime of a single authorization attempt.

use std::future::Future;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::provider::SecureStore;
use crate::types::TokenSet;

/// Durable key: the bearer access token.
pub const KEY_ACCESS_TOKEN: &str = "access_token";

/// Durable key: the refresh token, when issued.
pub const KEY_REFRESH_TOKEN: &str = "refresh_token";

/// Durable key: absolute access-token expiry (RFC 3339).
pub const KEY_TOKEN_EXPIRY: &str = "token_expiry";

/// Transient key: the in-flight PKCE code verifier.
pub const KEY_PKCE_VERIFIER: &str = "pkce_code_verifier";

/// Transient key: the in-flight state nonce.
pub const KEY_PKCE_STATE: &str = "pkce_state";

/// The transient PKCE material stashed for one authorization attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PkceStash {
    /// The code verifier to send with the token request.
    pub code_verifier: String,

    /// The state nonce to match against the callback.
    pub state: String,
}

/// Token persistence over a [`SecureStore`].
///
/// The blanket impl makes every secure store a token store; flows only ever
/// go through these methods so the key layout stays in one place.
pub trait TokenStore: SecureStore {
    /// Persist a token set under the durable keys.
    fn save_tokens(&self, tokens: &TokenSet) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.set(KEY_ACCESS_TOKEN, &tokens.access_token).await?;
            match &tokens.refresh_token {
                Some(refresh) => self.set(KEY_REFRESH_TOKEN, refresh).await?,
                None => self.remove(KEY_REFRESH_TOKEN).await?,
            }
            self.set(KEY_TOKEN_EXPIRY, &tokens.expires_at.to_rfc3339()).await
        }
    }

    /// Load the persisted token set, if complete.
    ///
    /// Token type is reconstituted as `Bearer` and scope is not persisted.
    fn tokens(&self) -> impl Future<Output = Result<Option<TokenSet>>> + Send {
        async move {
            let Some(access_token) = self.get(KEY_ACCESS_TOKEN).await? else {
                return Ok(None);
            };
            let Some(expiry) = self.get(KEY_TOKEN_EXPIRY).await? else {
                return Ok(None);
            };
            let expires_at = DateTime::parse_from_rfc3339(&expiry)?.with_timezone(&Utc);
            let refresh_token = self.get(KEY_REFRESH_TOKEN).await?;

            Ok(Some(TokenSet {
                access_token,
                refresh_token,
                token_type: "Bearer".to_string(),
                expires_at,
                scope: None,
            }))
        }
    }

    /// Remove every durable token key. Transient keys are untouched.
    fn clear_tokens(&self) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.remove(KEY_ACCESS_TOKEN).await?;
            self.remove(KEY_REFRESH_TOKEN).await?;
            self.remove(KEY_TOKEN_EXPIRY).await
        }
    }

    /// Stash the transient PKCE material for the in-flight attempt.
    fn stash_pkce(
        &self, code_verifier: &str, state: &str,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.set(KEY_PKCE_VERIFIER, code_verifier).await?;
            self.set(KEY_PKCE_STATE, state).await
        }
    }

    /// Load the stashed PKCE material, if both halves are present.
    fn stashed_pkce(&self) -> impl Future<Output = Result<Option<PkceStash>>> + Send {
        async move {
            let Some(code_verifier) = self.get(KEY_PKCE_VERIFIER).await? else {
                return Ok(None);
            };
            let Some(state) = self.get(KEY_PKCE_STATE).await? else {
                return Ok(None);
            };
            Ok(Some(PkceStash { code_verifier, state }))
        }
    }

    /// Remove the transient PKCE keys. Idempotent; durable keys untouched.
    fn purge_pkce(&self) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.remove(KEY_PKCE_VERIFIER).await?;
            self.remove(KEY_PKCE_STATE).await
        }
    }
}

impl<S: SecureStore> TokenStore for S {}
