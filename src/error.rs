use thiserror::Error;

/// Main error type for Kraken API calls
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (DNS, connection refused, timeout, ...)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The body could not be decoded as JSON although JSON decoding was requested
    #[error("failed to parse response body (status {status}): {source}")]
    Parse {
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// The HTTP client itself could not be constructed
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// No async runtime was available to run the request on
    #[error("no async runtime available: {0}")]
    Runtime(String),

    /// Request building error
    #[error("failed to build request: {0}")]
    RequestBuild(String),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Typed decoding of an already parsed body failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Create a parse error, keeping the raw payload for inspection
    pub fn parse(status: u16, body: String, source: serde_json::Error) -> Self {
        ApiError::Parse {
            status,
            body,
            source,
        }
    }

    /// Check if this error happened at the transport level
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// Check if this error is a body decoding failure
    pub fn is_parse(&self) -> bool {
        matches!(self, ApiError::Parse { .. })
    }

    /// Get the HTTP status code, when the server answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Parse { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type for Kraken API operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn bad_json() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{not json").unwrap_err()
    }

    #[test]
    fn test_parse_error_keeps_status_and_body() {
        let error = ApiError::parse(200, "{not json".to_string(), bad_json());
        assert!(error.is_parse());
        assert!(!error.is_transport());
        assert_eq!(error.status_code(), Some(200));

        match error {
            ApiError::Parse { body, .. } => assert_eq!(body, "{not json"),
            other => panic!("expected ApiError::Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_request_build_has_no_status() {
        let error = ApiError::RequestBuild("bad header".to_string());
        assert_eq!(error.status_code(), None);
        assert_eq!(error.to_string(), "failed to build request: bad header");
    }
}
