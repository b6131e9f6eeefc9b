//! HTTP client trait and the reqwest-backed implementation.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::FetchError;

/// Trait for HTTP clients, enabling mockability in tests.
///
/// Both methods return the response body for 2xx responses and
/// [`FetchError::Status`] (carrying the body) for anything else.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a URL and return the body as text.
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;

    /// POST a JSON body to a URL and return the response body as text.
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, FetchError>;
}

/// Configuration for [`ReqwestClient`].
#[derive(Clone, Debug)]
pub struct ReqwestClientBuilder {
    timeout: Option<Duration>,
    connect_timeout: Duration,
    user_agent: String,
}

impl Default for ReqwestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestClientBuilder {
    /// Create a builder with no overall request timeout.
    ///
    /// Deadlines belong to the callers: the search path wraps its requests in
    /// its own deadline, while classification and enrichment wait as long as
    /// the gateway takes.
    pub fn new() -> Self {
        Self {
            timeout: None,
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("fridge/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set an overall per-request timeout.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the TCP connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ReqwestClient, FetchError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(ReqwestClient {
            inner: builder.build()?,
        })
    }
}

/// Production HTTP client.
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Create a client with default configuration.
    pub fn new() -> Result<Self, FetchError> {
        ReqwestClientBuilder::new().build()
    }

    /// Get a builder for custom configuration.
    pub fn builder() -> ReqwestClientBuilder {
        ReqwestClientBuilder::new()
    }

    async fn read_body(url: &str, response: reqwest::Response) -> Result<String, FetchError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(url, status = %status, "network: request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(url, status = %status, bytes = body.len(), "network: fetched");
        Ok(body)
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        tracing::debug!(url, "network: GET");
        let response = self.inner.get(parsed).send().await?;
        Self::read_body(url, response).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        tracing::debug!(url, "network: POST");
        let response = self.inner.post(parsed).json(body).send().await?;
        Self::read_body(url, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_sending() {
        let client = ReqwestClient::new().unwrap();
        let err = client.get_text("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }
}
