use jobtrackr_types::AuthError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ENV_PREFIX: &str = "JOBTRACKR_";

fn default_scope() -> String {
    "openid email profile".to_string()
}
fn default_redirect_uri() -> String {
    "http://localhost:53682/callback".to_string()
}
fn default_authorize_path() -> String {
    "/oauth2/authorize".to_string()
}
fn default_safety_margin() -> u64 {
    300
}
fn default_request_timeout() -> u64 {
    10
}
fn default_callback_timeout() -> u64 {
    120
}
fn default_username_claim() -> String {
    "cognito:username".to_string()
}
fn default_namespace() -> String {
    "cli".to_string()
}
fn default_api_base() -> String {
    "http://localhost:8000".to_string()
}

/// Identity-provider settings for the Authorization Code + PKCE client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Hosted IdP domain, with or without scheme
    /// (e.g. `jobtrackr.auth.us-east-1.amazoncognito.com`).
    #[serde(default)]
    pub idp_domain: String,
    /// Registered public client id.
    #[serde(default)]
    pub client_id: String,
    /// Registered callback URI.
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    /// Space-separated scopes (defaults to `openid email profile`).
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Token endpoint override; derived from `idp_domain` when unset.
    #[serde(default)]
    pub token_endpoint: Option<String>,
    /// Authorize path: `/oauth2/authorize` or the hosted-UI `/login`.
    #[serde(default = "default_authorize_path")]
    pub authorize_path: String,
    /// ID tokens expiring within this many seconds count as expired.
    #[serde(default = "default_safety_margin")]
    pub safety_margin_secs: u64,
    /// Upper bound on a single token-endpoint call.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Upper bound on waiting for the authorize redirect.
    #[serde(default = "default_callback_timeout")]
    pub callback_timeout_secs: u64,
    /// Claim holding the provider username.
    #[serde(default = "default_username_claim")]
    pub username_claim: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            idp_domain: String::new(),
            client_id: String::new(),
            redirect_uri: default_redirect_uri(),
            scope: default_scope(),
            token_endpoint: None,
            authorize_path: default_authorize_path(),
            safety_margin_secs: default_safety_margin(),
            request_timeout_secs: default_request_timeout(),
            callback_timeout_secs: default_callback_timeout(),
            username_claim: default_username_claim(),
        }
    }
}

impl AuthConfig {
    /// `https://{idp_domain}` without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        let domain = self.idp_domain.trim().trim_end_matches('/');
        if domain.starts_with("https://") || domain.starts_with("http://") {
            domain.to_string()
        } else {
            format!("https://{domain}")
        }
    }

    /// Authorize endpoint without query parameters.
    #[must_use]
    pub fn authorize_endpoint(&self) -> String {
        let path = self.authorize_path.trim();
        if path.starts_with('/') {
            format!("{}{path}", self.base_url())
        } else {
            format!("{}/{path}", self.base_url())
        }
    }

    /// Token endpoint, either explicit or `{base_url}/oauth2/token`.
    #[must_use]
    pub fn token_url(&self) -> String {
        self.token_endpoint
            .clone()
            .unwrap_or_else(|| format!("{}/oauth2/token", self.base_url()))
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_secs)
    }

    /// Check that the settings needed to reach the IdP are present.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] naming the first missing field.
    pub fn validate(&self) -> Result<(), AuthError> {
        for (name, value) in [
            ("auth.idp_domain", &self.idp_domain),
            ("auth.client_id", &self.client_id),
            ("auth.redirect_uri", &self.redirect_uri),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::Config(format!("{name} is required")));
            }
        }
        Ok(())
    }
}

/// Backend API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the jobs backend (defaults to `http://localhost:8000`).
    #[serde(default = "default_api_base")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base(),
        }
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Scopes persisted state to one client instance (e.g. `extension`).
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            auth: AuthConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Config {
    /// Parses configuration from a YAML string, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the YAML is invalid or extraction fails.
    #[allow(clippy::result_large_err)]
    pub fn from_yaml(yaml: &str) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Format as _, Serialized, Yaml},
        };
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::string(yaml))
            .extract()
    }

    /// Loads defaults, then the YAML file (if any), then `JOBTRACKR_*`
    /// environment variables (`JOBTRACKR_AUTH__CLIENT_ID=…`).
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file cannot be read or parsed.
    #[allow(clippy::result_large_err)]
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Env, Format as _, Serialized, Yaml},
        };
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    /// Checks the auth settings and that `namespace` is set.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] naming the first missing setting.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.namespace.trim().is_empty() {
            return Err(AuthError::Config("namespace is required".into()));
        }
        self.auth.validate()
    }
}
