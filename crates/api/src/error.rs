use thiserror::Error;

/// Failures of a jobs-backend call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable ID token; the user must sign in.
    #[error("not signed in")]
    NotAuthenticated,

    /// The backend rejected the token (HTTP 401). Not retried.
    #[error("session expired, sign in again")]
    SessionExpired,

    /// Any other non-2xx response. `message` is the backend's own
    /// `message` field when it sent one.
    #[error("jobs API returned HTTP {status}")]
    Upstream {
        status: u16,
        message: Option<String>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] rquest::Error),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// `true` when signing in again would resolve the failure.
    #[must_use]
    pub fn needs_login(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::SessionExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_login() {
        assert!(ApiError::NotAuthenticated.needs_login());
        assert!(ApiError::SessionExpired.needs_login());
        assert!(
            !ApiError::Upstream {
                status: 500,
                message: None
            }
            .needs_login()
        );
    }

    #[test]
    fn test_upstream_display_omits_body() {
        let err = ApiError::Upstream {
            status: 422,
            message: Some("url is required".into()),
        };
        assert_eq!(err.to_string(), "jobs API returned HTTP 422");
    }
}
