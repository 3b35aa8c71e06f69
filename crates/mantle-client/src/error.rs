//! Client error types.

/// Errors that can occur when using the Mantle client.
///
/// A well-formed JSON error payload from the API (for example
/// `{"error": "..."}`) is not an error at this layer; it is returned to the
/// caller as regular data.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Invalid client construction.
    #[error("configuration error: {0}")]
    Config(String),

    /// A call argument failed its precondition. Raised before any I/O.
    #[error("validation error: {0}")]
    Validation(String),

    /// HTTP method outside GET/POST/PUT/DELETE.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The request path could not be resolved against the base URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not valid JSON, or a body could not be encoded.
    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether this error came from argument validation.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether this error came from client construction.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    pub(crate) fn required(field: &str) -> Self {
        Self::Validation(format!("{field} is required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_names_the_field() {
        let err = ClientError::required("eventName");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "validation error: eventName is required");
    }

    #[test]
    fn config_is_not_validation() {
        let err = ClientError::Config("appId is required".into());
        assert!(err.is_config());
        assert!(!err.is_validation());
    }
}
