//! Typed persistence for the token triple and the pending PKCE verifier.
//!
//! Both records live under a per-client namespace and are keyed
//! independently, so a crashed login attempt can never corrupt an existing
//! valid token record.

use jobtrackr_types::{KeyValueStore, TokenSet, error::Result};
use std::sync::Arc;

/// Persists the token triple and the ephemeral verifier on a [`KeyValueStore`].
#[derive(Clone)]
pub struct TokenStore {
    kv: Arc<dyn KeyValueStore>,
    tokens_key: String,
    verifier_key: String,
}

impl TokenStore {
    /// Scope both records under `namespace` (e.g. `"extension"`).
    pub fn new(kv: Arc<dyn KeyValueStore>, namespace: &str) -> Self {
        Self {
            kv,
            tokens_key: format!("{namespace}.tokens"),
            verifier_key: format!("{namespace}.pkce_verifier"),
        }
    }

    /// Overwrite the stored triple with `tokens`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or written.
    pub async fn save(&self, tokens: &TokenSet) -> Result<()> {
        let json = serde_json::to_string(tokens)?;
        self.kv.set(&self.tokens_key, &json).await
    }

    /// Load the stored triple.
    ///
    /// A record that no longer deserializes is reported as absent so that
    /// callers treat it as "not authenticated".
    ///
    /// # Errors
    ///
    /// Returns an error only if the underlying storage read fails.
    pub async fn load(&self) -> Result<Option<TokenSet>> {
        let Some(json) = self.kv.get(&self.tokens_key).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<TokenSet>(&json) {
            Ok(tokens) if !tokens.id_token.is_empty() => Ok(Some(tokens)),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::warn!(error = %e, key = %self.tokens_key, "discarding unreadable token record");
                Ok(None)
            }
        }
    }

    /// Remove the stored triple. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage write fails.
    pub async fn clear(&self) -> Result<()> {
        self.kv.remove(&self.tokens_key).await
    }

    /// # Errors
    ///
    /// Returns an error if the underlying storage write fails.
    pub async fn save_verifier(&self, verifier: &str) -> Result<()> {
        self.kv.set(&self.verifier_key, verifier).await
    }

    /// # Errors
    ///
    /// Returns an error if the underlying storage read fails.
    pub async fn load_verifier(&self) -> Result<Option<String>> {
        Ok(self
            .kv
            .get(&self.verifier_key)
            .await?
            .filter(|v| !v.is_empty()))
    }

    /// # Errors
    ///
    /// Returns an error if the underlying storage write fails.
    pub async fn clear_verifier(&self) -> Result<()> {
        self.kv.remove(&self.verifier_key).await
    }
}
