//! # Errors
//!
//! Flow errors for authorization, issuance, presentation, and verification.
//! Every variant maps to a stable user-facing message suitable for display
//! without leaking protocol internals.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the wallet flows.
#[derive(Error, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "error", content = "error_description")]
pub enum Error {
    /// The state nonce echoed in the authorization callback did not match the
    /// one sent. The flow aborts before any token request is made.
    #[error("csrf_mismatch: {0}")]
    CsrfMismatch(String),

    /// The user dismissed or abandoned the flow. Not a failure.
    #[error("cancelled")]
    Cancelled,

    /// No valid access token is available, or the backend rejected the one
    /// presented.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The holder declined consent. The flow stops with no network calls.
    #[error("consent_denied: {0}")]
    ConsentDenied(String),

    /// A transport failure or a 5xx response from a backend service.
    #[error("network_or_server: {0}")]
    NetworkOrServer(String),

    /// A malformed payload, a rejected request, or an invariant violation.
    #[error("validation: {0}")]
    Validation(String),
}

impl Error {
    /// A stable message suitable for direct display to the holder.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::CsrfMismatch(_) => "Sign-in could not be completed securely. Please try again.",
            Self::Cancelled => "Sign-in was cancelled.",
            Self::Unauthenticated(_) => "Please sign in to continue.",
            Self::ConsentDenied(_) => "The request was declined.",
            Self::NetworkOrServer(_) => "A service is unavailable. Please try again later.",
            Self::Validation(_) => "The request could not be processed.",
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<Self>() {
            Some(Self::CsrfMismatch(e)) => Self::CsrfMismatch(format!("{err}: {e}")),
            Some(Self::Cancelled) => Self::Cancelled,
            Some(Self::Unauthenticated(e)) => Self::Unauthenticated(format!("{err}: {e}")),
            Some(Self::ConsentDenied(e)) => Self::ConsentDenied(format!("{err}: {e}")),
            Some(Self::NetworkOrServer(e)) => Self::NetworkOrServer(format!("{err}: {e}")),
            Some(Self::Validation(e)) => Self::Validation(format!("{err}: {e}")),
            None => {
                let stack = err.chain().fold(String::new(), |cause, e| format!("{cause} -> {e}"));
                let stack = stack.trim_start_matches(" -> ").to_string();
                Self::NetworkOrServer(stack)
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return crate::http::status_error(status, &err.to_string());
        }
        Self::NetworkOrServer(err.to_string())
    }
}

/// Construct an `Error::Validation` error from a format string.
macro_rules! invalid {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::Validation(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::Validation(format!($err))
    };
}
pub(crate) use invalid;

#[cfg(test)]
mod test {
    use anyhow::{anyhow, Context};

    use super::*;

    #[test]
    fn flow_error_context() {
        let result = Err::<(), Error>(Error::CsrfMismatch("state mismatch".to_string()))
            .context("authorization callback");
        let err: Error = result.unwrap_err().into();

        assert_eq!(err.to_string(), "csrf_mismatch: authorization callback: state mismatch");
    }

    #[test]
    fn anyhow_context() {
        let result = Err::<(), anyhow::Error>(anyhow!("connection refused")).context("token call");
        let err: Error = result.unwrap_err().into();

        assert_eq!(err.to_string(), "network_or_server: token call -> connection refused");
    }

    #[test]
    fn user_messages_are_stable() {
        assert_eq!(Error::Cancelled.user_message(), "Sign-in was cancelled.");
        assert_eq!(
            Error::Unauthenticated("expired".to_string()).user_message(),
            "Please sign in to continue."
        );
    }
}
