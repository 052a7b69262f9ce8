use graph_directory::GraphError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Service-level error taxonomy surfaced by the lifecycle endpoints.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or blank required input; reported to the caller as a client
    /// error, not logged as a failure.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A subscription already exists; create is refused to keep at most one
    /// active subscription per resource.
    #[error("Subscription {existing_id} already exists")]
    SubscriptionExists { existing_id: String },

    /// The remote service accepted the create call but returned nothing.
    #[error("Subscription creation returned no subscription")]
    CreationFailed,

    /// Target does not exist (or is already deleted).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other remote-service failure.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl AppError {
    /// HTTP status class used by the operator endpoints.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) | AppError::SubscriptionExists { .. } => 400,
            AppError::NotFound(_) => 404,
            AppError::CreationFailed | AppError::Graph(_) => 500,
        }
    }
}
