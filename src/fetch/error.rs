use thiserror::Error;

/// Failures at the network boundary.
///
/// `Clone` so that every subscriber of a coalesced request receives the same
/// error value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("json error: {0}")]
    Decode(String),
}

impl FetchError {
    /// Returns true if the error is transient and should be retried.
    #[must_use]
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            Self::NotFound(_) | Self::Decode(_) => false,
        }
    }

    /// Short text suitable for an inline error message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Transport(_) => "Could not reach the server".to_string(),
            Self::Timeout => "The server took too long to respond".to_string(),
            Self::Http { status, .. } => format!("Request failed with status {status}"),
            Self::RateLimited => "Too many requests, slow down".to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Decode(_) => "Received an unexpected response".to_string(),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retried() {
        assert!(FetchError::Timeout.should_retry());
        assert!(FetchError::RateLimited.should_retry());
        assert!(FetchError::Http { status: 503, body: String::new() }.should_retry());
        assert!(!FetchError::Http { status: 400, body: String::new() }.should_retry());
        assert!(!FetchError::Decode("eof".to_string()).should_retry());
        assert!(!FetchError::NotFound("vehicle".to_string()).should_retry());
    }
}
