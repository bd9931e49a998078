//! Token records, endpoint responses and identity types.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current wall-clock time in epoch seconds.
#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// Successful (2xx) body of the token endpoint.
///
/// Every field is optional on the wire; validation happens when the response
/// is turned into a [`TokenSet`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// The persisted token triple plus endpoint metadata.
///
/// Stored and cleared as a single record. Expiry is derived from the ID
/// token's `exp` claim; `expires_in` is informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub id_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Epoch seconds at which the record was captured.
    pub captured_at: u64,
}

impl TokenSet {
    /// Build a record from an endpoint response.
    ///
    /// Returns `None` if the response carries no usable ID token. When the
    /// response omits a refresh token, `previous_refresh` is retained.
    #[must_use]
    pub fn from_response(resp: TokenResponse, previous_refresh: Option<String>) -> Option<Self> {
        let id_token = resp.id_token.filter(|t| !t.is_empty())?;
        Some(Self {
            access_token: resp.access_token.filter(|t| !t.is_empty()),
            id_token,
            refresh_token: resp
                .refresh_token
                .filter(|t| !t.is_empty())
                .or(previous_refresh),
            expires_in: resp.expires_in,
            token_type: resp.token_type,
            captured_at: unix_now(),
        })
    }
}

/// Identity extracted from the ID token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub email: Option<String>,
    pub sub: Option<String>,
    /// Provider username claim, falling back to `email`.
    pub username: Option<String>,
}

/// Query parameters delivered to the redirect URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// A callback carrying an authorization code.
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    /// A callback carrying an error.
    pub fn with_error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Parse a raw query string (`code=…&state=…`).
    ///
    /// # Errors
    ///
    /// Returns the decoder error if the query is not valid form encoding.
    pub fn from_query(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str(query)
    }

    /// Parse the query portion of a full redirect URL, ignoring any fragment.
    ///
    /// # Errors
    ///
    /// Returns the decoder error if the query is not valid form encoding.
    pub fn from_redirect_url(url: &str) -> Result<Self, serde_urlencoded::de::Error> {
        let query = url.split_once('?').map_or("", |(_, q)| q);
        let query = query.split('#').next().unwrap_or("");
        Self::from_query(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(id_token: Option<&str>, refresh: Option<&str>) -> TokenResponse {
        TokenResponse {
            access_token: Some("at".into()),
            id_token: id_token.map(String::from),
            refresh_token: refresh.map(String::from),
            expires_in: Some(3600),
            token_type: Some("Bearer".into()),
        }
    }

    #[test]
    fn test_from_response_requires_id_token() {
        assert!(TokenSet::from_response(response(None, None), None).is_none());
        assert!(TokenSet::from_response(response(Some(""), None), None).is_none());
    }

    #[test]
    fn test_from_response_keeps_previous_refresh() {
        let set = TokenSet::from_response(response(Some("id"), None), Some("R1".into())).unwrap();
        assert_eq!(set.refresh_token.as_deref(), Some("R1"));
    }

    #[test]
    fn test_from_response_prefers_rotated_refresh() {
        let set =
            TokenSet::from_response(response(Some("id"), Some("R2")), Some("R1".into())).unwrap();
        assert_eq!(set.refresh_token.as_deref(), Some("R2"));
        assert!(set.captured_at > 0);
    }

    #[test]
    fn test_token_response_tolerates_missing_fields() {
        let resp: TokenResponse = serde_json::from_str(r#"{"id_token":"x"}"#).unwrap();
        assert_eq!(resp.id_token.as_deref(), Some("x"));
        assert!(resp.access_token.is_none());
        assert!(resp.refresh_token.is_none());
    }

    #[test]
    fn test_callback_from_redirect_url() {
        let p = CallbackParams::from_redirect_url(
            "https://abc.chromiumapp.org/?code=XYZ&state=s#_=_",
        )
        .unwrap();
        assert_eq!(p.code.as_deref(), Some("XYZ"));
        assert!(p.error.is_none());
    }

    #[test]
    fn test_callback_error_decoded() {
        let p = CallbackParams::from_query("error=access_denied&error_description=User+cancelled")
            .unwrap();
        assert_eq!(p.error.as_deref(), Some("access_denied"));
        assert_eq!(p.error_description.as_deref(), Some("User cancelled"));
    }

    #[test]
    fn test_callback_without_query() {
        let p = CallbackParams::from_redirect_url("http://localhost:3000/callback").unwrap();
        assert_eq!(p, CallbackParams::default());
    }
}
