//! Core types and traits for the jobtrackr workspace.
//!
//! This crate defines the shared abstractions used by every client surface:
//! the authentication error taxonomy, the persisted token record, identity
//! claims, and the async traits at the storage, token-endpoint and
//! user-agent seams.

pub mod error;
pub mod token;
pub mod traits;

pub use error::{AuthError, DecodeError, EndpointError};
pub use token::{CallbackParams, TokenResponse, TokenSet, UserInfo, unix_now};
pub use traits::{AuthorizationAgent, KeyValueStore, TokenEndpoint};
