use thiserror::Error;

/// Transport-level failure talking to any HTTP endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("HTTP request timed out")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    InvalidBody(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Errors produced by a recipe search.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Please enter an ingredient or dish name")]
    Validation,

    #[error("Search timed out")]
    Timeout,

    #[error("Recipe database request failed: {0}")]
    Network(FetchError),
}

impl SearchError {
    /// Message suitable for showing to the user.
    ///
    /// Transport details stay in the logs; the user only learns whether the
    /// request timed out or failed outright.
    pub fn user_message(&self) -> String {
        match self {
            SearchError::Validation => self.to_string(),
            SearchError::Timeout => {
                "The request timed out. Check your connection and try again.".to_string()
            }
            SearchError::Network(_) => "Connection failed, please try again later.".to_string(),
        }
    }
}

impl From<FetchError> for SearchError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout => SearchError::Timeout,
            other => SearchError::Network(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_timeout_becomes_search_timeout() {
        assert_eq!(SearchError::from(FetchError::Timeout), SearchError::Timeout);
    }

    #[test]
    fn status_errors_are_network_errors() {
        let err = SearchError::from(FetchError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        });
        assert!(matches!(err, SearchError::Network(_)));
        assert_eq!(err.user_message(), "Connection failed, please try again later.");
    }
}
