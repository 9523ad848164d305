use chrono::NaiveDate;
use thiserror::Error;

/// Value-level validation failures raised when building domain records.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Value must be non-negative")]
    MustBeNonNegative,

    #[error("Value must be finite")]
    MustBeFinite,
}

/// Journal and consortium domain errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum JournalError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Holding not found: {0}")]
    HoldingNotFound(String),

    #[error("Holding {0} is already closed")]
    HoldingAlreadyClosed(String),

    #[error("No spot trade at index {0}")]
    TradeNotFound(usize),

    #[error("Client not found: {0}")]
    ClientNotFound(i64),

    #[error("No profit entry recorded for {0}")]
    ProfitNotFound(NaiveDate),
}

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl From<JournalError> for ApiError {
    fn from(error: JournalError) -> Self {
        match error {
            JournalError::Validation(e) => ApiError::InvalidRequest(e.to_string()),
            JournalError::HoldingAlreadyClosed(_) => ApiError::Conflict(error.to_string()),
            JournalError::HoldingNotFound(_)
            | JournalError::TradeNotFound(_)
            | JournalError::ClientNotFound(_)
            | JournalError::ProfitNotFound(_) => ApiError::NotFound(error.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::InvalidRequest(error.to_string())
    }
}
