//! Scripted [`SpeechApi`] test double shared by the speech and pipeline tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::speech::api::{ApiError, JobStatus, SpeechApi};

/// Answers from a script and counts every call.
///
/// * `create_session` always returns the configured result.
/// * `submit` pops scripted errors first, then returns the request id.
/// * `fetch_result` pops scripted statuses, then reports `Pending` forever.
pub struct MockSpeechApi {
    session: Result<String, ApiError>,
    request_id: String,
    submit_errors: Mutex<VecDeque<ApiError>>,
    polls: Mutex<VecDeque<Result<JobStatus, ApiError>>>,
    submitted: Mutex<Vec<(String, String, String)>>,
    session_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    poll_calls: AtomicUsize,
}

impl MockSpeechApi {
    pub fn new(session_id: &str, request_id: &str) -> Self {
        Self {
            session: Ok(session_id.to_string()),
            request_id: request_id.to_string(),
            submit_errors: Mutex::new(VecDeque::new()),
            polls: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
            session_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_polls(self, polls: Vec<Result<JobStatus, ApiError>>) -> Self {
        *self.polls.lock().unwrap() = polls.into();
        self
    }

    pub fn failing_session(mut self, error: ApiError) -> Self {
        self.session = Err(error);
        self
    }

    pub fn failing_submit(self, errors: Vec<ApiError>) -> Self {
        *self.submit_errors.lock().unwrap() = errors.into();
        self
    }

    pub fn session_calls(&self) -> usize {
        self.session_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    /// Every `(session_id, text, model)` passed to `submit`.
    pub fn submitted(&self) -> Vec<(String, String, String)> {
        self.submitted.lock().unwrap().clone()
    }

    /// Total number of network calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.session_calls() + self.submit_calls() + self.poll_calls()
    }
}

#[async_trait]
impl SpeechApi for MockSpeechApi {
    async fn create_session(&self) -> Result<String, ApiError> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.session.clone()
    }

    async fn submit(&self, session_id: &str, text: &str, model: &str) -> Result<String, ApiError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push((
            session_id.to_string(),
            text.to_string(),
            model.to_string(),
        ));
        if let Some(err) = self.submit_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(self.request_id.clone())
    }

    async fn fetch_result(&self, _request_id: &str) -> Result<JobStatus, ApiError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(JobStatus::Pending))
    }
}
