//! HTTP client for the alerting hub.
//!
//! One [`FeedClient`] serves all three backend interactions: the
//! idempotent fragment GET driven by the poll cycle, the per-alert
//! acknowledge PUT, and the form-encoded comment POST. Every request
//! runs under the configured timeout so the fetching phase is always
//! bounded.

use serde::Deserialize;
use serde_json::json;
use tokio::time::Duration;
use tracing::debug;

use vigil_core::ServerConfig;

use crate::error::{FeedError, Result};
use crate::fragment::AlertFragment;

/// Client for the alerting hub's HTTP API.
pub struct FeedClient {
    client: reqwest::Client,
    base_url: String,
    alerts_path: String,
    query: Vec<(String, String)>,
    csrf_token: Option<String>,
    timeout_secs: u64,
}

/// Success payload of a comment submission.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentReceipt {
    pub user: String,
    pub content: String,
    pub id: u64,
}

#[derive(Debug, Deserialize)]
struct CommentResponse {
    status: String,
    user: Option<String>,
    content: Option<String>,
    id: Option<u64>,
    errors: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    detail: Option<String>,
}

impl FeedClient {
    /// Build a client from the server configuration.
    pub fn new(server: &ServerConfig, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FeedError::ConnectionFailed(format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            base_url: server.base_url.trim_end_matches('/').to_string(),
            alerts_path: server.alerts_path.clone(),
            query: server.query.clone(),
            csrf_token: server.csrf_token.clone(),
            timeout_secs,
        })
    }

    /// Fetch the current alert list fragment.
    ///
    /// Idempotent GET; the configured page query parameters (filters,
    /// pagination) are forwarded on every request.
    pub async fn fetch_fragment(&self) -> Result<AlertFragment> {
        let url = format!("{}{}", self.base_url, self.alerts_path);
        debug!(%url, "fetching alert fragment");

        let response = self
            .client
            .get(&url)
            .query(&self.query)
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::from_http_status(status, &body));
        }

        response
            .json::<AlertFragment>()
            .await
            .map_err(|e| FeedError::InvalidFragment(e.to_string()))
    }

    /// Acknowledge one alert with a comment.
    ///
    /// Single attempt per user action; the caller decides whether to
    /// surface the failure and leave the action re-triable.
    pub async fn acknowledge(&self, fingerprint: &str, comment: &str) -> Result<()> {
        if comment.trim().is_empty() {
            return Err(FeedError::AcknowledgeRejected(
                "a comment is required".to_string(),
            ));
        }

        let url = format!(
            "{}/api/v1/alerts/{}/acknowledge/",
            self.base_url, fingerprint
        );
        debug!(%url, fingerprint, "acknowledging alert");

        let mut request = self
            .client
            .put(&url)
            .header("X-Requested-With", "XMLHttpRequest")
            .json(&json!({ "comment": comment, "acknowledged": true }));
        if let Some(token) = &self.csrf_token {
            request = request.header("X-CSRFToken", token);
        }

        let response = request.send().await.map_err(|e| self.request_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // Prefer the backend's detail message over the bare status.
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail)
            .unwrap_or_else(|| format!("acknowledgement failed with status {}", status.as_u16()));
        Err(FeedError::AcknowledgeRejected(detail))
    }

    /// Submit a comment on the page at `page_path`.
    ///
    /// Form-encoded POST carrying `content`, `comment=true`, and the
    /// CSRF token, matching the backend's form handler.
    pub async fn submit_comment(&self, page_path: &str, content: &str) -> Result<CommentReceipt> {
        let url = format!("{}{}", self.base_url, page_path);
        debug!(%url, "submitting comment");

        let token = self.csrf_token.clone().unwrap_or_default();
        let form = [
            ("content", content),
            ("comment", "true"),
            ("csrfmiddlewaretoken", token.as_str()),
        ];

        let mut request = self
            .client
            .post(&url)
            .header("X-Requested-With", "XMLHttpRequest")
            .form(&form);
        if let Some(token) = &self.csrf_token {
            request = request.header("X-CSRFToken", token);
        }

        let response = request.send().await.map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::from_http_status(status, &body));
        }

        let body: CommentResponse = response
            .json()
            .await
            .map_err(|e| FeedError::CommentRejected(e.to_string()))?;

        if body.status == "success" {
            Ok(CommentReceipt {
                user: body.user.unwrap_or_default(),
                content: body.content.unwrap_or_default(),
                id: body.id.unwrap_or_default(),
            })
        } else {
            let errors = body
                .errors
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            Err(FeedError::CommentRejected(errors))
        }
    }

    fn request_error(&self, e: reqwest::Error) -> FeedError {
        if e.is_timeout() {
            FeedError::Timeout(self.timeout_secs)
        } else {
            FeedError::from(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(base_url: &str) -> ServerConfig {
        ServerConfig {
            base_url: base_url.to_string(),
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_empty_comment_rejected_without_request() {
        // Backend never sees the request; the client refuses first
        let client = FeedClient::new(&server("http://127.0.0.1:1"), 1).unwrap();
        let result = client.acknowledge("abc", "   ").await;
        assert!(matches!(result, Err(FeedError::AcknowledgeRejected(_))));
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let client = FeedClient::new(&server("http://hub.internal:9000/"), 10).unwrap();
        assert_eq!(client.base_url, "http://hub.internal:9000");
    }
}
