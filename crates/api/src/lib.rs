//! Authenticated client for the JobTrackr jobs backend.
//!
//! Every request carries the session's current ID token, obtained through
//! [`AuthSession::get_valid_token`](jobtrackr_auth::AuthSession::get_valid_token)
//! so an expired token is refreshed once before the call goes out.

pub mod client;
pub mod error;
pub mod model;

pub use client::JobsClient;
pub use error::{ApiError, Result};
pub use model::{IngestJobRequest, IngestJobResponse, JobApplication, JobPage, JobUpdate};
