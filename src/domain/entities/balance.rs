//! Balance entity - the account's starting capital

use serde::{Deserialize, Serialize};

use crate::domain::errors::ValidationError;

/// Initial account balance. Overwritten on save, no history kept.
///
/// Stored on disk as `{"initial_balance": <number>}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Balance {
    #[serde(default)]
    pub initial_balance: f64,
}

impl Balance {
    pub fn new(initial_balance: f64) -> Result<Self, ValidationError> {
        if !initial_balance.is_finite() {
            return Err(ValidationError::MustBeFinite);
        }
        if initial_balance < 0.0 {
            return Err(ValidationError::MustBeNonNegative);
        }
        Ok(Self { initial_balance })
    }
}
