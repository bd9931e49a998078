//! The auth session controller.
//!
//! Orchestrates the authorize redirect, code exchange, silent refresh and
//! logout over a [`TokenStore`], a [`TokenEndpoint`] and an
//! [`AuthorizationAgent`]. One instance serves one client environment and is
//! shared behind an `Arc`.
//!
//! Responsibilities:
//! - The PKCE verifier is cleared on every exit path of a login attempt.
//! - A failed login never writes the token record.
//! - A rejected refresh logs the session out.
//! - At most one refresh is in flight; concurrent callers share its result.

use jobtrackr_config::AuthConfig;
use jobtrackr_store::TokenStore;
use jobtrackr_types::{
    AuthError, AuthorizationAgent, CallbackParams, KeyValueStore, TokenEndpoint, TokenSet,
    UserInfo, error::Result,
};
use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    agent::BrowserAgent,
    authorize::{build_authorize_url, code_exchange_form, refresh_form},
    endpoint::HttpTokenEndpoint,
    jwt,
    pkce::PkcePair,
};

/// Lifecycle of one client instance's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggingIn,
    LoggedIn,
    Refreshing,
}

pub struct AuthSession {
    config: AuthConfig,
    store: TokenStore,
    endpoint: Arc<dyn TokenEndpoint>,
    agent: Arc<dyn AuthorizationAgent>,
    state: Mutex<SessionState>,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl AuthSession {
    pub fn new(
        config: AuthConfig,
        store: TokenStore,
        endpoint: Arc<dyn TokenEndpoint>,
        agent: Arc<dyn AuthorizationAgent>,
    ) -> Self {
        Self {
            config,
            store,
            endpoint,
            agent,
            state: Mutex::new(SessionState::LoggedOut),
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Build a session with the HTTP token endpoint and the system-browser
    /// agent, storing state under `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if the configuration is incomplete or
    /// the redirect URI cannot be served locally.
    pub fn with_defaults(
        config: AuthConfig,
        kv: Arc<dyn KeyValueStore>,
        namespace: &str,
    ) -> Result<Self> {
        config.validate()?;
        let endpoint = HttpTokenEndpoint::new(
            rquest::Client::new(),
            config.token_url(),
            config.request_timeout(),
        );
        let agent = BrowserAgent::from_config(&config)?;
        Ok(Self::new(
            config,
            TokenStore::new(kv, namespace),
            Arc::new(endpoint),
            Arc::new(agent),
        ))
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// The state of this instance. A freshly constructed session starts
    /// `LoggedOut` even if valid tokens are stored; use
    /// [`is_authenticated`](Self::is_authenticated) for the derived answer.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, next: SessionState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != next {
            tracing::debug!(from = ?*state, to = ?next, "session state");
            *state = next;
        }
    }

    // ── Login ────────────────────────────────────────────────────────────

    /// Run the whole interactive flow through the [`AuthorizationAgent`].
    ///
    /// # Errors
    ///
    /// Any [`AuthError`] of the login taxonomy. The verifier is cleared and
    /// the stored tokens are untouched on failure.
    pub async fn login(&self) -> Result<UserInfo> {
        let url = self.start_login().await?;
        match self.agent.authorize(&url).await {
            Ok(params) => self.complete_login(params).await,
            Err(e) => {
                tracing::info!(error = %e, "sign-in abandoned");
                self.abort_login().await;
                Err(e)
            }
        }
    }

    /// First half of a redirect login: persist a fresh verifier and return
    /// the authorize URL to navigate to.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Entropy`] or [`AuthError::Storage`]; the login
    /// is aborted in both cases.
    pub async fn start_login(&self) -> Result<String> {
        self.transition(SessionState::LoggingIn);
        let started = async {
            let pair = PkcePair::generate()?;
            self.store.save_verifier(&pair.verifier).await?;
            Ok(build_authorize_url(&self.config, &pair.challenge))
        }
        .await;
        if started.is_err() {
            self.abort_login().await;
        }
        started
    }

    /// Second half of a redirect login: exchange the callback's code using
    /// the persisted verifier.
    ///
    /// # Errors
    ///
    /// [`AuthError::AuthorizationDenied`], [`AuthError::NoCode`],
    /// [`AuthError::NoVerifier`], [`AuthError::ExchangeFailed`],
    /// [`AuthError::NoIdToken`] or [`AuthError::Decode`].
    pub async fn complete_login(&self, params: CallbackParams) -> Result<UserInfo> {
        let result = self.exchange_callback(params).await;
        if let Err(e) = self.store.clear_verifier().await {
            tracing::warn!(error = %e, "failed to clear PKCE verifier");
        }
        match &result {
            Ok(user) => {
                self.transition(SessionState::LoggedIn);
                tracing::info!(user = ?user.username, "login successful");
            }
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                self.transition(SessionState::LoggedOut);
            }
        }
        result
    }

    async fn exchange_callback(&self, params: CallbackParams) -> Result<UserInfo> {
        if let Some(error) = params.error {
            let reason = match params.error_description {
                Some(desc) => format!("{error}: {desc}"),
                None => error,
            };
            return Err(AuthError::AuthorizationDenied(reason));
        }
        let code = params
            .code
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::NoCode)?;
        let verifier = self
            .store
            .load_verifier()
            .await?
            .ok_or(AuthError::NoVerifier)?;

        let form = code_exchange_form(&self.config, &code, &verifier);
        let resp = self
            .endpoint
            .request(&form)
            .await
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?;

        let tokens = TokenSet::from_response(resp, None).ok_or(AuthError::NoIdToken)?;
        let user = jwt::decode(&tokens.id_token)?.user_info(&self.config.username_claim);
        self.store.save(&tokens).await?;
        Ok(user)
    }

    async fn abort_login(&self) {
        if let Err(e) = self.store.clear_verifier().await {
            tracing::warn!(error = %e, "failed to clear PKCE verifier");
        }
        self.transition(SessionState::LoggedOut);
    }

    // ── Session queries ──────────────────────────────────────────────────

    /// `true` iff a token record exists and its ID token is not within the
    /// safety margin of expiry. Never fails.
    pub async fn is_authenticated(&self) -> bool {
        self.load_logged()
            .await
            .is_some_and(|tokens| !self.expired(&tokens))
    }

    /// Identity claims of the stored ID token.
    pub async fn user_info(&self) -> Option<UserInfo> {
        let tokens = self.store.load().await.ok()??;
        jwt::decode(&tokens.id_token)
            .ok()
            .map(|claims| claims.user_info(&self.config.username_claim))
    }

    /// A usable ID token, refreshing once if the stored one is expired.
    ///
    /// Returns `None` when signed out or when the refresh fails; a rejected
    /// refresh has already logged the session out.
    pub async fn get_valid_token(&self) -> Option<String> {
        let tokens = self.load_logged().await?;
        if !self.expired(&tokens) {
            return Some(tokens.id_token);
        }

        let _gate = self.refresh_gate.lock().await;
        // A refresh may have completed while we waited on the gate.
        let tokens = self.load_logged().await?;
        if !self.expired(&tokens) {
            return Some(tokens.id_token);
        }

        match self.refresh_locked().await {
            Ok(()) => self.load_logged().await.map(|t| t.id_token),
            Err(e) => {
                tracing::debug!(error = %e, "no valid token available");
                None
            }
        }
    }

    async fn load_logged(&self) -> Option<TokenSet> {
        match self.store.load().await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "token store unreadable");
                None
            }
        }
    }

    fn expired(&self, tokens: &TokenSet) -> bool {
        jwt::is_expired(&tokens.id_token, self.config.safety_margin_secs)
    }

    // ── Refresh / logout ─────────────────────────────────────────────────

    /// Exchange the stored refresh token for a new token record.
    ///
    /// # Errors
    ///
    /// [`AuthError::NoRefreshToken`] with no side effects, or
    /// [`AuthError::RefreshFailed`] after logging the session out.
    pub async fn refresh(&self) -> Result<()> {
        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    /// Caller must hold `refresh_gate`.
    async fn refresh_locked(&self) -> Result<()> {
        let refresh_token = self
            .store
            .load()
            .await?
            .and_then(|t| t.refresh_token)
            .ok_or(AuthError::NoRefreshToken)?;

        self.transition(SessionState::Refreshing);
        let form = refresh_form(&self.config, &refresh_token);
        let refreshed = match self.endpoint.request(&form).await {
            Ok(resp) => TokenSet::from_response(resp, Some(refresh_token.clone()))
                .ok_or_else(|| "response carried no id_token".to_string()),
            Err(e) => Err(e.to_string()),
        };

        match refreshed {
            Ok(tokens) => {
                if let Err(e) = self.store.save(&tokens).await {
                    self.logout().await;
                    return Err(e);
                }
                self.transition(SessionState::LoggedIn);
                tracing::info!("tokens refreshed");
                Ok(())
            }
            Err(reason) => {
                tracing::warn!(reason = %reason, "refresh rejected, logging out");
                self.logout().await;
                Err(AuthError::RefreshFailed(reason))
            }
        }
    }

    /// Clear the token record and any pending verifier. Always succeeds;
    /// no network call is made.
    pub async fn logout(&self) {
        if let Err(e) = self.store.clear().await {
            tracing::warn!(error = %e, "failed to clear token record");
        }
        if let Err(e) = self.store.clear_verifier().await {
            tracing::warn!(error = %e, "failed to clear PKCE verifier");
        }
        self.transition(SessionState::LoggedOut);
        tracing::info!("logged out");
    }
}
