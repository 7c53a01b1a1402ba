use thiserror::Error;

#[derive(Error, Debug)]
pub enum GroupingError {
    #[error("grouping: empty input")]
    EmptyInput,

    #[error("grouping: API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("grouping: HTTP error: {0}")]
    Http(String),

    #[error("grouping: malformed reply: {0}")]
    Malformed(String),
}

impl GroupingError {
    /// Returns true if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, GroupingError::Api { status: 429, .. })
    }

    /// Returns true if this is a server-side error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, GroupingError::Api { status, .. } if *status >= 500)
    }

    /// Returns true if the request can be retried as is.
    /// Transport failures count as retryable.
    pub fn is_retryable(&self) -> bool {
        self.is_rate_limit() || self.is_server_error() || matches!(self, GroupingError::Http(_))
    }
}

impl From<reqwest::Error> for GroupingError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => GroupingError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => GroupingError::Http(err.to_string()),
        }
    }
}
