//! OAuth2 Authorization Code + PKCE client for the JobTrackr identity
//! provider.
//!
//! The sub-modules cover PKCE material, ID-token decoding, authorize URL and
//! grant construction, the token endpoint client and the loopback browser
//! agent. [`AuthSession`] ties them together over a
//! [`TokenStore`](jobtrackr_store::TokenStore).

pub mod agent;
pub mod authorize;
pub mod callback;
pub mod endpoint;
pub mod jwt;
pub mod pkce;
pub mod session;

pub use agent::BrowserAgent;
pub use endpoint::HttpTokenEndpoint;
pub use session::{AuthSession, SessionState};
