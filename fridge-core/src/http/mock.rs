//! Scriptable HTTP client for tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::client::HttpClient;
use crate::error::FetchError;

/// Mock response for testing.
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// 200 with this body.
    Body(String),
    /// Non-2xx status with this body.
    Status(u16, String),
    /// Transport failure.
    Error(String),
    /// Wait (on the tokio clock) before producing the inner response.
    Delayed(Duration, Box<MockResponse>),
}

impl MockResponse {
    pub fn json(value: serde_json::Value) -> Self {
        MockResponse::Body(value.to_string())
    }

    pub fn delayed(delay: Duration, response: MockResponse) -> Self {
        MockResponse::Delayed(delay, Box::new(response))
    }
}

/// A request observed by [`MockClient`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

/// Mock HTTP client for testing.
///
/// Responses are matched on the exact URL. Several responses registered for
/// one URL are served in order; the last one is repeated once the queue is
/// down to it.
#[derive(Default)]
pub struct MockClient {
    responses: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockClient {
    /// Create a new empty mock client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for a URL.
    pub fn with_response(self, url: &str, response: MockResponse) -> Self {
        self.push_response(url, response);
        self
    }

    /// Queue a 200 JSON response for a URL.
    pub fn with_json(self, url: &str, value: serde_json::Value) -> Self {
        self.with_response(url, MockResponse::json(value))
    }

    /// Queue a transport error for a URL.
    pub fn with_error(self, url: &str, error: &str) -> Self {
        self.with_response(url, MockResponse::Error(error.to_string()))
    }

    /// Queue a response on an already shared client.
    pub fn push_response(&self, url: &str, response: MockResponse) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    /// Every request seen so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests made to `url`.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    fn record(&self, method: &'static str, url: &str, body: Option<&serde_json::Value>) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                method,
                url: url.to_string(),
                body: body.cloned(),
            });
    }

    fn next_response(&self, url: &str) -> Option<MockResponse> {
        let mut responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = responses.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    async fn respond(&self, url: &str) -> Result<String, FetchError> {
        let mut response = self
            .next_response(url)
            .ok_or_else(|| FetchError::Transport(format!("No mock response for URL: {url}")))?;

        loop {
            match response {
                MockResponse::Body(body) => return Ok(body),
                MockResponse::Status(status, body) => {
                    return Err(FetchError::Status { status, body })
                }
                MockResponse::Error(e) => return Err(FetchError::Transport(e)),
                MockResponse::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    response = *inner;
                }
            }
        }
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.record("GET", url, None);
        self.respond(url).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, FetchError> {
        self.record("POST", url, Some(body));
        self.respond(url).await
    }
}
