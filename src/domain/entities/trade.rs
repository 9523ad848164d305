//! Trade records kept in the journal.
//!
//! Spot trades carry full price detail; futures records only keep the day's
//! PnL. Both feed the same daily aggregation through [`JournalEntry`].

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::errors::ValidationError;
use crate::domain::value_objects::{pnl::PnL, price::Price, quantity::Quantity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Long => write!(f, "Long"),
            PositionSide::Short => write!(f, "Short"),
        }
    }
}

/// Anything the statistics aggregator can fold into daily PnL.
pub trait JournalEntry {
    fn date(&self) -> NaiveDate;
    fn pnl(&self) -> PnL;

    /// Traded volume, if the record tracks one.
    fn volume(&self) -> Option<f64> {
        None
    }

    fn symbol(&self) -> Option<&str> {
        None
    }
}

/// A closed spot trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotTrade {
    pub date: NaiveDate,
    pub symbol: String,
    pub position: PositionSide,
    pub entry_price: Price,
    pub exit_price: Price,
    pub volume: Quantity,
    pub pnl: PnL,
    #[serde(default)]
    pub notes: String,
    pub timestamp: NaiveDateTime,
}

/// Fields submitted when logging a spot trade.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSpotTrade {
    pub date: NaiveDate,
    pub symbol: String,
    pub position: PositionSide,
    pub entry_price: f64,
    pub exit_price: f64,
    pub volume: f64,
    pub pnl: f64,
    #[serde(default)]
    pub notes: String,
}

impl SpotTrade {
    pub fn from_input(input: NewSpotTrade, timestamp: NaiveDateTime) -> Result<Self, ValidationError> {
        let symbol = input.symbol.trim();
        if symbol.is_empty() {
            return Err(ValidationError::InvalidSymbol(
                "symbol must not be empty".to_string(),
            ));
        }

        Ok(SpotTrade {
            date: input.date,
            symbol: symbol.to_string(),
            position: input.position,
            entry_price: Price::new(input.entry_price)?,
            exit_price: Price::new(input.exit_price)?,
            volume: Quantity::new(input.volume)?,
            pnl: PnL::new(input.pnl)?,
            notes: input.notes,
            timestamp,
        })
    }
}

impl JournalEntry for SpotTrade {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn pnl(&self) -> PnL {
        self.pnl
    }

    fn volume(&self) -> Option<f64> {
        Some(self.volume.value())
    }

    fn symbol(&self) -> Option<&str> {
        Some(&self.symbol)
    }
}

/// A day's futures result. No price detail is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuturesRecord {
    pub date: NaiveDate,
    pub pnl: PnL,
    #[serde(default)]
    pub notes: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFuturesRecord {
    pub date: NaiveDate,
    pub pnl: f64,
    #[serde(default)]
    pub notes: String,
}

impl FuturesRecord {
    pub fn from_input(
        input: NewFuturesRecord,
        timestamp: NaiveDateTime,
    ) -> Result<Self, ValidationError> {
        Ok(FuturesRecord {
            date: input.date,
            pnl: PnL::new(input.pnl)?,
            notes: input.notes,
            timestamp,
        })
    }
}

impl JournalEntry for FuturesRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn pnl(&self) -> PnL {
        self.pnl
    }
}
