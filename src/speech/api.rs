//! Remote speech-service client.
//!
//! [`SpeechApi`] is the seam between the orchestration core and the network.
//! [`HttpSpeechApi`] speaks the service's JSON wire format over `reqwest`:
//!
//! | Call | Request | Response |
//! |------|---------|----------|
//! | create session | `POST /api/session` | `{ "session_id": … }` |
//! | submit job | `POST /api/tts/{session_id}` `{ "text", "model" }` | `{ "request_id": … }` |
//! | fetch status | `GET /api/result/{request_id}` | `{ "status", "result"?: { "data" } }` |
//!
//! All connection details come from [`SpeechConfig`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SpeechConfig;

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors returned by a [`SpeechApi`] call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The service answered with a non-success HTTP status.
    #[error("service returned HTTP {0}")]
    Status(u16),

    /// The response body was not the expected JSON shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// `true` for statuses that suggest the session id was not accepted.
    pub fn is_session_rejection(&self) -> bool {
        matches!(self, ApiError::Status(401 | 403 | 404))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Malformed(e.to_string())
        } else {
            ApiError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Status of a synthesis job as reported by one poll.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// Still running.
    Pending,
    /// Finished; `audio` is the base64-encoded payload.
    Completed { audio: String },
    /// The service gave up on the job.
    Error,
    /// Any status string the client does not know.  Treated as non-terminal.
    Other(String),
}

impl JobStatus {
    /// Short label for diagnostics.
    pub fn label(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Completed { .. } => "completed",
            JobStatus::Error => "error",
            JobStatus::Other(s) => s.as_str(),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SessionResponse {
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    text: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultResponse {
    status: Option<String>,
    result: Option<ResultPayload>,
}

#[derive(Debug, Deserialize)]
struct ResultPayload {
    data: Option<String>,
}

impl ResultResponse {
    fn into_status(self) -> Result<JobStatus, ApiError> {
        let status = self
            .status
            .ok_or_else(|| ApiError::Malformed("missing `status`".into()))?;

        match status.as_str() {
            "pending" => Ok(JobStatus::Pending),
            "error" => Ok(JobStatus::Error),
            "completed" => {
                let audio = self
                    .result
                    .and_then(|r| r.data)
                    .filter(|d| !d.is_empty())
                    .ok_or_else(|| ApiError::Malformed("completed job without `result.data`".into()))?;
                Ok(JobStatus::Completed { audio })
            }
            _ => Ok(JobStatus::Other(status)),
        }
    }
}

/// Reject `None` and empty identifiers.
fn require_id(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::Malformed(format!("missing `{field}`")))
}

// ---------------------------------------------------------------------------
// SpeechApi trait
// ---------------------------------------------------------------------------

/// Async interface to the remote text-to-speech service.
///
/// Implementors must be `Send + Sync` so they can be shared behind an
/// `Arc<dyn SpeechApi>`.
#[async_trait]
pub trait SpeechApi: Send + Sync {
    /// Create a new session and return its opaque id.
    async fn create_session(&self) -> Result<String, ApiError>;

    /// Submit a synthesis job and return the remote request id.
    async fn submit(&self, session_id: &str, text: &str, model: &str) -> Result<String, ApiError>;

    /// Fetch the current status of a job.
    async fn fetch_result(&self, request_id: &str) -> Result<JobStatus, ApiError>;
}

// ---------------------------------------------------------------------------
// HttpSpeechApi
// ---------------------------------------------------------------------------

/// [`SpeechApi`] over HTTP/JSON.
pub struct HttpSpeechApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSpeechApi {
    /// Build the client from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`.  A default client is used as a last-resort
    /// fallback if the builder fails.
    pub fn from_config(config: &SpeechConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Join `segments` onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, ApiError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ApiError::Request(format!("invalid base URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Request(format!("base URL cannot have a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        log::debug!("speech api: {} -> HTTP {}", response.url().path(), status.as_u16());
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl SpeechApi for HttpSpeechApi {
    async fn create_session(&self) -> Result<String, ApiError> {
        let url = self.endpoint(&["api", "session"])?;
        let response = self.client.post(url).send().await?;
        let body: SessionResponse = Self::read_json(response).await?;
        require_id(body.session_id, "session_id")
    }

    async fn submit(&self, session_id: &str, text: &str, model: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&["api", "tts", session_id])?;
        let response = self
            .client
            .post(url)
            .json(&SubmitRequest { text, model })
            .send()
            .await?;
        let body: SubmitResponse = Self::read_json(response).await?;
        require_id(body.request_id, "request_id")
    }

    async fn fetch_result(&self, request_id: &str) -> Result<JobStatus, ApiError> {
        let url = self.endpoint(&["api", "result", request_id])?;
        let response = self.client.get(url).send().await?;
        let body: ResultResponse = Self::read_json(response).await?;
        body.into_status()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
