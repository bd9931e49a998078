//! System-browser [`AuthorizationAgent`] with a loopback redirect listener.

use async_trait::async_trait;
use jobtrackr_config::AuthConfig;
use jobtrackr_types::{AuthError, AuthorizationAgent, CallbackParams, error::Result};
use std::time::Duration;
use url::Url;

use crate::callback;

/// Opens the authorize URL in the user's browser and waits for the
/// provider to redirect back to `http://localhost:<port><path>`.
#[derive(Debug, Clone)]
pub struct BrowserAgent {
    port: u16,
    path: String,
    timeout: Duration,
}

impl BrowserAgent {
    /// Derive the listener address from the configured redirect URI.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if the redirect URI is not a loopback
    /// `http` URL.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let url = Url::parse(&config.redirect_uri)
            .map_err(|e| AuthError::Config(format!("invalid redirect_uri: {e}")))?;
        let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1"));
        if url.scheme() != "http" || !loopback {
            return Err(AuthError::Config(format!(
                "redirect_uri {} is not a loopback http URL; the browser agent cannot receive it",
                config.redirect_uri
            )));
        }
        let port = url
            .port_or_known_default()
            .ok_or_else(|| AuthError::Config("redirect_uri has no port".into()))?;
        Ok(Self {
            port,
            path: url.path().to_string(),
            timeout: config.callback_timeout(),
        })
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl AuthorizationAgent for BrowserAgent {
    async fn authorize(&self, url: &str) -> Result<CallbackParams> {
        let listener = callback::bind_callback(self.port).await?;
        open_browser(url);
        callback::accept_callback(listener, &self.path, self.timeout).await
    }
}

fn open_browser(url: &str) {
    tracing::info!("opening browser for sign-in");
    if let Err(e) = open::that(url) {
        tracing::warn!(error = %e, "failed to open browser automatically");
        eprintln!("Open the following URL to sign in:");
        eprintln!("{url}");
    }
}
