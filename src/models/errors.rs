use thiserror::Error;
use uuid::Uuid;

/// Service-level errors that can occur in the ordering workflow
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Order session not found: {session_id}")]
    SessionNotFound { session_id: Uuid },

    #[error("Order already submitted for session: {session_id}")]
    OrderAlreadySubmitted { session_id: Uuid },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Repository error: {source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },
}

/// Repository-level errors for session storage
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Item not found")]
    NotFound,

    #[error("Session capacity exceeded: limit={limit}")]
    CapacityExceeded { limit: usize },
}

/// Validation errors for input data
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid field value: {field}={value}, reason={reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Duplicate drink id in catalog: {id}")]
    DuplicateId { id: u32 },

    #[error("Catalog must contain at least one drink")]
    EmptyCatalog,
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::ValidationError {
            message: err.to_string(),
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;
