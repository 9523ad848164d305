pub mod consortium_service;
pub mod journal_service;

use crate::domain::errors::{JournalError, ValidationError};
use crate::persistence::json_store::StoreError;
use crate::persistence::DatabaseError;
use crate::secrets::SecretError;

/// Failures from the application services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] JournalError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error("Invalid credentials")]
    InvalidCredentials,
}

impl From<ValidationError> for ServiceError {
    fn from(error: ValidationError) -> Self {
        ServiceError::Domain(JournalError::Validation(error))
    }
}
