//! Local JWT payload inspection.
//!
//! Decodes the claims segment of an ID token to read `exp` and identity
//! claims. The signature is **not** verified: nothing here is a trust
//! boundary. The backend verifies every token it receives.

use base64::{
    Engine as _,
    alphabet::URL_SAFE,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use jobtrackr_types::{DecodeError, UserInfo, unix_now};
use serde::Deserialize;
use serde_json::{Map, Value};

/// base64url, accepting both padded and unpadded payloads.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims read from an ID token payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub exp: Option<u64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Extract [`UserInfo`], reading the username from `username_claim` and
    /// falling back to `email`.
    #[must_use]
    pub fn user_info(&self, username_claim: &str) -> UserInfo {
        let username = self
            .extra
            .get(username_claim)
            .and_then(Value::as_str)
            .map(String::from)
            .or_else(|| self.email.clone());
        UserInfo {
            email: self.email.clone(),
            sub: self.sub.clone(),
            username,
        }
    }
}

/// Decode the payload of a three-segment token.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the token is not three dot-separated
/// segments, the payload is not base64url, or it is not a JSON object.
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::Malformed(segments.len()));
    }
    let payload = URL_SAFE_LENIENT
        .decode(segments[1])
        .map_err(|_| DecodeError::Base64)?;
    serde_json::from_slice(&payload).map_err(|e| DecodeError::Json(e.to_string()))
}

/// `true` unless the token decodes, carries `exp`, and `exp > now + margin`.
#[must_use]
pub fn is_expired(token: &str, safety_margin_secs: u64) -> bool {
    is_expired_at(token, safety_margin_secs, unix_now())
}

/// [`is_expired`] against an explicit clock.
#[must_use]
pub fn is_expired_at(token: &str, safety_margin_secs: u64, now: u64) -> bool {
    match decode(token) {
        Ok(Claims { exp: Some(exp), .. }) => exp <= now.saturating_add(safety_margin_secs),
        Ok(_) => true,
        Err(e) => {
            tracing::debug!(error = %e, "treating undecodable token as expired");
            true
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::{URL_SAFE as PADDED, URL_SAFE_NO_PAD};
    use serde_json::json;

    /// Unsigned test token with the given payload.
    pub(crate) fn make_token(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn test_decode_claims() {
        let token = make_token(&json!({
            "exp": 1_900_000_000u64,
            "email": "ada@example.com",
            "sub": "user-1",
            "cognito:username": "ada"
        }));
        let claims = decode(&token).unwrap();
        assert_eq!(claims.exp, Some(1_900_000_000));
        assert_eq!(claims.email.as_deref(), Some("ada@example.com"));
        assert_eq!(claims.sub.as_deref(), Some("user-1"));
        let info = claims.user_info("cognito:username");
        assert_eq!(info.username.as_deref(), Some("ada"));
    }

    #[test]
    fn test_username_falls_back_to_email() {
        let token = make_token(&json!({"email": "ada@example.com", "sub": "u"}));
        let info = decode(&token).unwrap().user_info("cognito:username");
        assert_eq!(info.username.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn test_decode_padded_payload() {
        let body = PADDED.encode(r#"{"exp":1}"#);
        let token = format!("h.{body}.s");
        assert_eq!(decode(&token).unwrap().exp, Some(1));
    }

    #[test]
    fn test_decode_rejects_wrong_segment_count() {
        assert_eq!(decode("not-a-jwt").unwrap_err(), DecodeError::Malformed(1));
        assert_eq!(decode("a.b").unwrap_err(), DecodeError::Malformed(2));
        assert_eq!(decode("a.b.c.d").unwrap_err(), DecodeError::Malformed(4));
    }

    #[test]
    fn test_decode_rejects_bad_payload() {
        assert_eq!(decode("a.!!!.c").unwrap_err(), DecodeError::Base64);
        let not_json = URL_SAFE_NO_PAD.encode("plain text");
        assert!(matches!(
            decode(&format!("a.{not_json}.c")),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn test_expired_one_second_ago() {
        let now = 1_800_000_000;
        let token = make_token(&json!({"exp": now - 1}));
        assert!(is_expired_at(&token, 300, now));
        assert!(is_expired_at(&token, 0, now));
    }

    #[test]
    fn test_valid_just_beyond_margin() {
        let now = 1_800_000_000;
        let token = make_token(&json!({"exp": now + 300 + 1}));
        assert!(!is_expired_at(&token, 300, now));
    }

    #[test]
    fn test_expiry_at_margin_boundary_is_expired() {
        let now = 1_800_000_000;
        let token = make_token(&json!({"exp": now + 300}));
        assert!(is_expired_at(&token, 300, now));
    }

    #[test]
    fn test_malformed_and_missing_exp_are_expired() {
        assert!(is_expired("a.b", 0));
        assert!(is_expired("garbage", 0));
        let token = make_token(&json!({"email": "x@example.com"}));
        assert!(is_expired(&token, 0));
    }

    #[test]
    fn test_live_clock() {
        let token = make_token(&json!({"exp": unix_now() + 3600}));
        assert!(!is_expired(&token, 300));
    }
}
