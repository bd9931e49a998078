//! Authorize-redirect URL and token-endpoint form bodies.

use jobtrackr_config::AuthConfig;

/// Build the authorize URL carrying the S256 challenge.
///
/// Parameter order follows the hosted UI's documented example; the scope is
/// form-encoded (`openid+email+profile`).
#[must_use]
pub fn build_authorize_url(config: &AuthConfig, code_challenge: &str) -> String {
    let query = serde_urlencoded::to_string([
        ("client_id", config.client_id.as_str()),
        ("response_type", "code"),
        ("scope", config.scope.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("code_challenge", code_challenge),
        ("code_challenge_method", "S256"),
    ])
    .unwrap_or_default();
    format!("{}?{query}", config.authorize_endpoint())
}

/// Form body for the `authorization_code` grant.
///
/// `code_verifier` is the original, unhashed verifier.
#[must_use]
pub fn code_exchange_form<'a>(
    config: &'a AuthConfig,
    code: &'a str,
    code_verifier: &'a str,
) -> [(&'static str, &'a str); 5] {
    [
        ("grant_type", "authorization_code"),
        ("client_id", config.client_id.as_str()),
        ("code", code),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("code_verifier", code_verifier),
    ]
}

/// Form body for the `refresh_token` grant.
#[must_use]
pub fn refresh_form<'a>(
    config: &'a AuthConfig,
    refresh_token: &'a str,
) -> [(&'static str, &'a str); 3] {
    [
        ("grant_type", "refresh_token"),
        ("client_id", config.client_id.as_str()),
        ("refresh_token", refresh_token),
    ]
}
