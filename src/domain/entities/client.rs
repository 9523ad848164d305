//! Consortium participants and the profit entries distributed to them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::errors::ValidationError;
use crate::domain::value_objects::pnl::PnL;

/// An investor in the pooled account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    /// Capital put into the pool. Never negative.
    pub invested: f64,
    pub join_date: NaiveDate,
    pub note: String,
}

impl Client {
    /// Whether the client takes part in the distribution for `date`.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.join_date <= date
    }
}

/// Validated client fields, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientDraft {
    pub name: String,
    pub invested: f64,
    pub join_date: NaiveDate,
    pub note: String,
}

impl ClientDraft {
    pub fn new(
        name: &str,
        invested: f64,
        join_date: NaiveDate,
        note: &str,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::InvalidName(
                "client name must not be empty".to_string(),
            ));
        }
        if !invested.is_finite() {
            return Err(ValidationError::MustBeFinite);
        }
        if invested < 0.0 {
            return Err(ValidationError::MustBeNonNegative);
        }
        Ok(Self {
            name: name.to_string(),
            invested,
            join_date,
            note: note.to_string(),
        })
    }
}

/// Profit (or loss) recorded for the whole pool on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitEntry {
    pub id: i64,
    pub profit_date: NaiveDate,
    pub total_profit: PnL,
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_client_active_on_join_date() {
        let client = Client {
            id: 1,
            name: "A".to_string(),
            invested: 100.0,
            join_date: day(5),
            note: String::new(),
        };
        assert!(!client.is_active_on(day(4)));
        assert!(client.is_active_on(day(5)));
        assert!(client.is_active_on(day(6)));
    }

    #[test]
    fn test_client_draft_validation() {
        assert!(ClientDraft::new("  ", 10.0, day(1), "").is_err());
        assert_eq!(
            ClientDraft::new("Budi", -1.0, day(1), ""),
            Err(ValidationError::MustBeNonNegative)
        );
        let draft = ClientDraft::new(" Budi ", 0.0, day(1), "seed").unwrap();
        assert_eq!(draft.name, "Budi");
    }
}
