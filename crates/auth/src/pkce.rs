//! PKCE (Proof Key for Code Exchange) parameter generation.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jobtrackr_types::{AuthError, error::Result};
use rand::{RngCore as _, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Bytes of OS randomness behind each verifier (43 base64url chars).
const VERIFIER_BYTES: usize = 32;

/// A verifier and its S256 challenge, valid for one login attempt.
#[derive(Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    /// Generate a fresh pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Entropy`] if the OS random source fails.
    pub fn generate() -> Result<Self> {
        let verifier = generate_verifier()?;
        let challenge = generate_challenge(&verifier);
        Ok(Self {
            verifier,
            challenge,
        })
    }
}

impl std::fmt::Debug for PkcePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkcePair")
            .field("verifier", &"<redacted>")
            .field("challenge", &self.challenge)
            .finish()
    }
}

/// Generate a `code_verifier` from the OS CSPRNG, base64url without padding.
///
/// # Errors
///
/// Returns [`AuthError::Entropy`] if the OS random source fails.
pub fn generate_verifier() -> Result<String> {
    let mut bytes = [0u8; VERIFIER_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Entropy(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// `base64url(SHA-256(verifier))` without padding.
#[must_use]
pub fn generate_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest.as_slice())
}
