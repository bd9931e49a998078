//! Error taxonomy for the authentication core.

use thiserror::Error;

/// Enumerates all failures an authentication operation can report.
///
/// Every variant is terminal for the operation that raised it. The only
/// automatic retry in the system is the single refresh attempt made while
/// resolving a valid token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The user denied consent or abandoned the provider's login page.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The authorization callback carried neither a code nor an error.
    #[error("no authorization code received")]
    NoCode,

    /// A callback arrived but no PKCE verifier was pending for it.
    #[error("no pending PKCE verifier for this callback")]
    NoVerifier,

    /// The authorization-code exchange was rejected or did not complete.
    #[error("token exchange failed: {0}")]
    ExchangeFailed(String),

    /// The token endpoint answered without an ID token.
    #[error("no id_token in token response")]
    NoIdToken,

    /// A refresh was requested but no refresh token is stored.
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The refresh grant was rejected; the session has been logged out.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// An ID token could not be decoded for claim inspection.
    #[error("id token decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The secure random source is unavailable.
    #[error("secure random source unavailable: {0}")]
    Entropy(String),

    /// Durable client storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// A short message safe to show in a UI.
    ///
    /// Never includes provider response bodies or token material.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AuthorizationDenied(_) => "Sign-in was cancelled.",
            Self::NoCode | Self::NoVerifier => {
                "Sign-in did not complete. Please try again."
            }
            Self::ExchangeFailed(_) | Self::NoIdToken => {
                "Failed to complete authentication."
            }
            Self::NoRefreshToken | Self::RefreshFailed(_) | Self::Decode(_) => {
                "Your session has expired. Please sign in again."
            }
            Self::Entropy(_) | Self::Storage(_) | Self::Config(_) => {
                "Authentication is unavailable on this device."
            }
        }
    }

    /// Returns `true` if the user merely abandoned the flow.
    #[must_use]
    pub fn is_user_abandoned(&self) -> bool {
        matches!(self, Self::AuthorizationDenied(_))
    }
}

/// Failure to decode a JWT payload for local inspection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The token is not three dot-separated segments.
    #[error("malformed token: expected 3 segments, found {0}")]
    Malformed(usize),

    /// The payload segment is not valid base64url.
    #[error("payload is not valid base64url")]
    Base64,

    /// The payload is not a JSON object.
    #[error("payload is not valid JSON: {0}")]
    Json(String),
}

/// Failure talking to the identity provider's token endpoint.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The endpoint answered with a non-2xx status.
    #[error("token endpoint returned status {0}")]
    Status(u16),

    /// The request did not complete within the configured bound.
    #[error("token endpoint timed out")]
    Timeout,

    /// Transport-level failure (DNS, TLS, connection reset …).
    #[error("transport error: {0}")]
    Transport(String),

    /// A 2xx response whose body is not a token response.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        Self::Storage(format!("record serialization: {e}"))
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_exchange() {
        let err = AuthError::ExchangeFailed("token endpoint returned status 400".into());
        assert_eq!(
            err.to_string(),
            "token exchange failed: token endpoint returned status 400"
        );
    }

    #[test]
    fn test_decode_error_conversion() {
        let err: AuthError = DecodeError::Malformed(2).into();
        assert!(matches!(err, AuthError::Decode(DecodeError::Malformed(2))));
    }

    #[test]
    fn test_user_message_hides_detail() {
        let err = AuthError::ExchangeFailed("invalid_grant: secret provider text".into());
        assert!(!err.user_message().contains("invalid_grant"));
        let err = AuthError::RefreshFailed("status 400".into());
        assert!(err.user_message().contains("sign in again"));
    }

    #[test]
    fn test_user_abandoned() {
        assert!(AuthError::AuthorizationDenied("access_denied".into()).is_user_abandoned());
        assert!(!AuthError::NoCode.is_user_abandoned());
    }

    #[test]
    fn test_serialization_error_maps_to_storage() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{{").unwrap_err();
        let err: AuthError = json_err.into();
        assert!(matches!(err, AuthError::Storage(_)));
    }
}
