//! Configuration loading for jobtrackr clients.
//!
//! Uses figment to layer serialized defaults, an optional YAML file and
//! `JOBTRACKR_`-prefixed environment variables into one explicit [`Config`]
//! that is handed to the auth controller and API client.

pub mod schema;

pub use schema::{ApiConfig, AuthConfig, Config};
