//! HTTP client for the `/api/jobs` endpoints.

use jobtrackr_auth::AuthSession;
use jobtrackr_config::ApiConfig;
use rquest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

use crate::error::{ApiError, Result};
use crate::model::{IngestJobRequest, IngestJobResponse, JobPage, JobUpdate};

/// Jobs backend client bound to one [`AuthSession`].
#[derive(Clone)]
pub struct JobsClient {
    http: Client,
    base_url: String,
    session: Arc<AuthSession>,
}

impl JobsClient {
    pub fn new(http: Client, base_url: impl Into<String>, session: Arc<AuthSession>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            session,
        }
    }

    #[must_use]
    pub fn from_config(config: &ApiConfig, session: Arc<AuthSession>) -> Self {
        Self::new(Client::new(), config.base_url.clone(), session)
    }

    /// Submit a posting URL for extraction.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn ingest_job(&self, request: &IngestJobRequest) -> Result<IngestJobResponse> {
        let url = build_url(&self.base_url, &["api", "jobs", "ingest"], &[])?;
        let resp = self.send(self.http.post(url.as_str()).json(request)).await?;
        decode(resp).await
    }

    /// Fetch one page of applications. `last_key` is the previous page's
    /// `next_page_token`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn list_jobs(&self, limit: u32, last_key: Option<&str>) -> Result<JobPage> {
        let limit = limit.to_string();
        let mut query = vec![("limit", limit.as_str())];
        if let Some(key) = last_key.filter(|k| !k.is_empty()) {
            query.push(("last_key", key));
        }
        let url = build_url(&self.base_url, &["api", "jobs"], &query)?;
        let resp = self.send(self.http.get(url.as_str())).await?;
        decode(resp).await
    }

    /// Apply a partial update to one application.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn update_job(&self, job_id: &str, applied_ts: &str, update: &JobUpdate) -> Result<()> {
        let url = build_url(
            &self.base_url,
            &["api", "jobs", job_id],
            &[("applied_ts", applied_ts)],
        )?;
        self.send(self.http.put(url.as_str()).json(update)).await?;
        Ok(())
    }

    /// Delete one application.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn delete_job(&self, job_id: &str, applied_ts: &str) -> Result<()> {
        let url = build_url(
            &self.base_url,
            &["api", "jobs", job_id],
            &[("applied_ts", applied_ts)],
        )?;
        self.send(self.http.delete(url.as_str())).await?;
        Ok(())
    }

    /// Attach the raw ID token and map the response status.
    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let token = self
            .session
            .get_valid_token()
            .await
            .ok_or(ApiError::NotAuthenticated)?;
        let resp = builder.header("Authorization", token).send().await?;
        check_status(resp).await
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status.as_u16() == 401 {
        tracing::info!("jobs API rejected the session token");
        return Err(ApiError::SessionExpired);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), body = %body, "jobs API error");
    Err(ApiError::Upstream {
        status: status.as_u16(),
        message: backend_message(&body),
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

/// The backend's `{"message": "..."}` error field, if present.
fn backend_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("message")?.as_str().map(str::to_owned)
}

/// Append path segments (percent-encoded) and query pairs to `base`,
/// keeping any path prefix such as an API stage name.
fn build_url(base: &str, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| ApiError::InvalidUrl(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ApiError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}
