//! Async traits shared across all jobtrackr crates.
//!
//! Every cross-crate seam is defined here so that higher layers depend only
//! on `jobtrackr-types`, not on each other.

use crate::{CallbackParams, EndpointError, TokenResponse, error::Result};
use async_trait::async_trait;

/// Client-local persistent key-value storage.
///
/// One implementation exists per runtime (extension storage, web local
/// storage, a `SQLite` file for the CLI). The auth logic is written once
/// against this capability set.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;
    /// Write a value, overwriting any prior one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Remove a value. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// The identity provider's token endpoint.
///
/// `form` is the complete `application/x-www-form-urlencoded` body,
/// including `grant_type` and `client_id`.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    async fn request(&self, form: &[(&str, &str)])
    -> std::result::Result<TokenResponse, EndpointError>;
}

/// Directs the user agent to the authorize URL and awaits the redirect.
#[async_trait]
pub trait AuthorizationAgent: Send + Sync {
    /// Navigate to `url` and return the parameters delivered to the
    /// redirect URI.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::AuthorizationDenied`] if the user closes
    /// the provider's page or the wait is abandoned.
    async fn authorize(&self, url: &str) -> Result<CallbackParams>;
}
