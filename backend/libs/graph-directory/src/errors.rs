use thiserror::Error;

/// Result type alias using `GraphError`.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur when talking to Microsoft Graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Resource not found (HTTP 404 or an OData `ResourceNotFound` code).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Graph API error reported through an OData error body.
    #[error("Graph API error: {code} - {message}")]
    Api { code: String, message: String },

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Token acquisition failed.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GraphError {
    /// Maps an OData error code/message to the right variant. Graph signals
    /// soft-deleted and never-existed resources alike with a
    /// `ResourceNotFound`-class code, which callers treat as a domain event
    /// rather than a failure.
    pub fn from_odata(code: String, message: String) -> Self {
        if code.contains("ResourceNotFound") {
            GraphError::NotFound(message)
        } else {
            GraphError::Api { code, message }
        }
    }

    /// Whether this error is the not-found class.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound(_))
    }
}
