//! HTTP client for the identity provider's token endpoint.

use async_trait::async_trait;
use jobtrackr_types::{EndpointError, TokenEndpoint, TokenResponse};
use std::time::Duration;

/// Posts form-encoded grants to a token endpoint with a bounded wait.
pub struct HttpTokenEndpoint {
    http: rquest::Client,
    url: String,
    timeout: Duration,
}

impl HttpTokenEndpoint {
    pub fn new(http: rquest::Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            url: url.into(),
            timeout,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, form: &[(&str, &str)]) -> Result<TokenResponse, EndpointError> {
        let resp = self
            .http
            .post(&self.url)
            .header("Accept", "application/json")
            .form(form)
            .send()
            .await
            .map_err(|e| EndpointError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            // Provider error bodies stay in the debug log, never in the error.
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %body, "token endpoint rejected grant");
            return Err(EndpointError::Status(status.as_u16()));
        }

        resp.json::<TokenResponse>()
            .await
            .map_err(|e| EndpointError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl TokenEndpoint for HttpTokenEndpoint {
    async fn request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, EndpointError> {
        tokio::time::timeout(self.timeout, self.send(form))
            .await
            .map_err(|_| EndpointError::Timeout)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Form, Json, Router, http::StatusCode, routing::post};
    use std::collections::HashMap;

    async fn token_handler(
        Form(form): Form<HashMap<String, String>>,
    ) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
        match form.get("grant_type").map(String::as_str) {
            Some("authorization_code") if form.get("code_verifier").is_some() => {
                Ok(Json(serde_json::json!({
                    "access_token": "at",
                    "id_token": format!("id-for-{}", form["code"]),
                    "refresh_token": "rt",
                    "expires_in": 3600,
                    "token_type": "Bearer"
                })))
            }
            Some("refresh_token") => Err((
                StatusCode::BAD_REQUEST,
                r#"{"error":"invalid_grant"}"#.to_string(),
            )),
            _ => Ok(Json(serde_json::json!("not a token response"))),
        }
    }

    async fn slow_handler() -> Json<serde_json::Value> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Json(serde_json::json!({}))
    }

    async fn serve() -> String {
        let app = Router::new()
            .route("/oauth2/token", post(token_handler))
            .route("/slow", post(slow_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_code_exchange_success() {
        let base = serve().await;
        let ep = HttpTokenEndpoint::new(
            rquest::Client::new(),
            format!("{base}/oauth2/token"),
            Duration::from_secs(5),
        );
        let resp = ep
            .request(&[
                ("grant_type", "authorization_code"),
                ("client_id", "cid"),
                ("code", "XYZ"),
                ("code_verifier", "v"),
            ])
            .await
            .unwrap();
        assert_eq!(resp.id_token.as_deref(), Some("id-for-XYZ"));
        assert_eq!(resp.refresh_token.as_deref(), Some("rt"));
        assert_eq!(resp.expires_in, Some(3600));
    }

    #[tokio::test]
    async fn test_non_2xx_is_status_error_without_body() {
        let base = serve().await;
        let ep = HttpTokenEndpoint::new(
            rquest::Client::new(),
            format!("{base}/oauth2/token"),
            Duration::from_secs(5),
        );
        let err = ep
            .request(&[("grant_type", "refresh_token"), ("refresh_token", "R1")])
            .await
            .unwrap_err();
        assert!(matches!(err, EndpointError::Status(400)));
        assert!(!err.to_string().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn test_unexpected_body_is_invalid_response() {
        let base = serve().await;
        let ep = HttpTokenEndpoint::new(
            rquest::Client::new(),
            format!("{base}/oauth2/token"),
            Duration::from_secs(5),
        );
        let err = ep.request(&[("grant_type", "other")]).await.unwrap_err();
        assert!(matches!(err, EndpointError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let base = serve().await;
        let ep = HttpTokenEndpoint::new(
            rquest::Client::new(),
            format!("{base}/slow"),
            Duration::from_millis(100),
        );
        let err = ep.request(&[]).await.unwrap_err();
        assert!(matches!(err, EndpointError::Timeout));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let ep = HttpTokenEndpoint::new(
            rquest::Client::new(),
            format!("http://{addr}/oauth2/token"),
            Duration::from_secs(5),
        );
        let err = ep.request(&[]).await.unwrap_err();
        assert!(matches!(err, EndpointError::Transport(_)));
    }
}
