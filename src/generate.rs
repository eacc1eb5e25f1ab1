//! # Generate
//!
//! Cryptographic material for the authorization flow: PKCE verifier and
//! challenge pairs plus single-use state nonces.

use anyhow::anyhow;
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::types::PkceParameters;
use crate::Result;

/// The only supported challenge method.
pub const CHALLENGE_METHOD_S256: &str = "S256";

const VERIFIER_BYTES: usize = 32;

/// Generate a fresh set of PKCE parameters for one authorization attempt.
///
/// The verifier is the unpadded base64url encoding of 32 bytes from the
/// OS CSPRNG (43 characters, within the 43..=128 URL-safe range). The
/// challenge is derived with [`code_challenge`] and the state nonce is a
/// UUID, unique per attempt.
///
/// # Errors
///
/// Returns an error if the OS random source fails.
pub fn pkce() -> Result<PkceParameters> {
    let mut seed = [0u8; VERIFIER_BYTES];
    OsRng
        .try_fill_bytes(&mut seed)
        .map_err(|e| anyhow!("failed to read from OS random source: {e}"))?;

    let code_verifier = Base64UrlUnpadded::encode_string(&seed);
    let code_challenge = code_challenge(&code_verifier);

    Ok(PkceParameters {
        code_verifier,
        code_challenge,
        code_challenge_method: CHALLENGE_METHOD_S256.to_string(),
        state: state(),
    })
}

/// Derive the S256 code challenge for a verifier: the unpadded base64url
/// encoding of the SHA-256 digest of the verifier's ASCII bytes.
#[must_use]
pub fn code_challenge(verifier: &str) -> String {
    Base64UrlUnpadded::encode_string(&Sha256::digest(verifier.as_bytes()))
}

/// Generate a single-use state nonce.
#[must_use]
pub fn state() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Generate a fresh presentation nonce.
#[must_use]
pub fn nonce() -> String {
    uuid::Uuid::new_v4().to_string()
}
