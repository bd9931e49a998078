//! Wire types of the jobs backend.

use serde::{Deserialize, Serialize};

/// A tracked job application as returned by `GET /api/jobs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobApplication {
    pub job_id: String,
    /// Sort key of the application; required to update or delete it.
    pub applied_ts: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub job_url: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub last_updated_ts: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One page of applications. Pass `next_page_token` back as `last_key`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPage {
    #[serde(default)]
    pub jobs: Vec<JobApplication>,
    #[serde(default)]
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestJobRequest {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestJobResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

/// Partial update of an application; unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl JobUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.notes.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_defaults_when_fields_missing() {
        let page: JobPage = serde_json::from_value(json!({})).unwrap();
        assert!(page.jobs.is_empty());
        assert_eq!(page.count, 0);
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_application_ignores_storage_keys() {
        let job: JobApplication = serde_json::from_value(json!({
            "job_id": "j1",
            "applied_ts": "2024-05-01T10:00:00Z",
            "company": "Acme",
            "title": "Engineer",
            "status": "applied",
            "job_url": "https://jobs.example.com/1",
            "user_id": "user-1",
            "last_updated_ts": "2024-05-02T10:00:00Z",
            "tags": ["rust"],
            "PK": "USER#user-1",
            "SK": "JOB#j1",
            "type": "job"
        }))
        .unwrap();
        assert_eq!(job.company, "Acme");
        assert_eq!(job.tags, vec!["rust".to_string()]);
        assert!(job.location.is_none());
    }

    #[test]
    fn test_update_serializes_only_set_fields() {
        let update = JobUpdate {
            status: Some("interview".into()),
            notes: None,
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"status": "interview"})
        );
        assert!(JobUpdate::default().is_empty());
    }

    #[test]
    fn test_ingest_request_omits_missing_resume() {
        let req = IngestJobRequest {
            url: "https://jobs.example.com/1".into(),
            resume_url: None,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"url": "https://jobs.example.com/1"})
        );
    }
}
