//! Floating positions.
//!
//! A holding stays `open` while its PnL is unrealized. Closing it is a one-way
//! transition that realizes the PnL and yields the spot trade to append to the
//! trade history.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::entities::trade::{PositionSide, SpotTrade};
use crate::domain::errors::{JournalError, ValidationError};
use crate::domain::value_objects::{pnl::PnL, price::Price, quantity::Quantity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldingStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: String,
    pub symbol: String,
    pub quantity: Quantity,
    pub entry_price: Price,
    pub current_price: Price,
    pub entry_date: NaiveDate,
    pub unrealized_pnl: PnL,
    pub status: HoldingStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_date: Option<NaiveDate>,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHolding {
    pub symbol: String,
    pub quantity: f64,
    pub entry_price: f64,
    #[serde(default)]
    pub current_price: f64,
    pub entry_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

/// What closing a holding produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedPosition {
    pub realized_pnl: PnL,
    pub trade: SpotTrade,
}

fn unrealized(quantity: Quantity, entry_price: Price, current_price: Price) -> PnL {
    if current_price.is_zero() {
        return PnL::zero();
    }
    let cost_basis = quantity.value() * entry_price.value();
    let current_value = quantity.value() * current_price.value();
    PnL::new(current_value - cost_basis).unwrap_or_default()
}

impl Holding {
    /// Open a new holding.
    ///
    /// Requires a symbol, a positive quantity and a positive entry price. A
    /// zero current price means "not quoted yet" and leaves the PnL at zero.
    pub fn open(id: String, input: NewHolding, timestamp: NaiveDateTime) -> Result<Self, ValidationError> {
        let symbol = input.symbol.trim();
        if symbol.is_empty() {
            return Err(ValidationError::InvalidSymbol(
                "symbol must not be empty".to_string(),
            ));
        }

        let quantity = Quantity::new(input.quantity)?;
        if quantity.is_zero() {
            return Err(ValidationError::InvalidQuantity(
                "quantity must be greater than zero".to_string(),
            ));
        }

        let entry_price = Price::new(input.entry_price)?;
        if entry_price.is_zero() {
            return Err(ValidationError::InvalidPrice(
                "entry price must be greater than zero".to_string(),
            ));
        }

        let current_price = Price::new(input.current_price)?;

        Ok(Holding {
            id,
            symbol: symbol.to_string(),
            quantity,
            entry_price,
            current_price,
            entry_date: input.entry_date,
            unrealized_pnl: unrealized(quantity, entry_price, current_price),
            status: HoldingStatus::Open,
            notes: input.notes,
            close_price: None,
            close_date: None,
            timestamp,
        })
    }

    pub fn is_open(&self) -> bool {
        self.status == HoldingStatus::Open
    }

    pub fn cost_basis(&self) -> f64 {
        self.quantity.value() * self.entry_price.value()
    }

    pub fn current_value(&self) -> f64 {
        self.quantity.value() * self.current_price.value()
    }

    /// Unrealized return in percent of the entry price.
    pub fn pnl_percent(&self) -> f64 {
        if self.entry_price.is_zero() {
            return 0.0;
        }
        (self.current_price.value() - self.entry_price.value()) / self.entry_price.value() * 100.0
    }

    /// Re-mark an open holding at a new market price.
    pub fn update_price(&mut self, price: Price) -> Result<(), JournalError> {
        if !self.is_open() {
            return Err(JournalError::HoldingAlreadyClosed(self.id.clone()));
        }
        self.current_price = price;
        let diff = self.quantity.value() * price.value() - self.cost_basis();
        self.unrealized_pnl = PnL::new(diff)?;
        Ok(())
    }

    /// Close the holding at `close_price` on `close_date`.
    ///
    /// Returns the realized PnL and the spot trade that records the close.
    pub fn close(
        &mut self,
        close_price: Price,
        close_date: NaiveDate,
        timestamp: NaiveDateTime,
    ) -> Result<ClosedPosition, JournalError> {
        if !self.is_open() {
            return Err(JournalError::HoldingAlreadyClosed(self.id.clone()));
        }

        let realized_pnl =
            PnL::new(self.quantity.value() * (close_price.value() - self.entry_price.value()))?;
        let volume = Quantity::new(self.quantity.value() * close_price.value())?;

        let trade = SpotTrade {
            date: close_date,
            symbol: self.symbol.clone(),
            position: PositionSide::Long,
            entry_price: self.entry_price,
            exit_price: close_price,
            volume,
            pnl: realized_pnl,
            notes: format!("Closed from holdings. {}", self.notes),
            timestamp,
        };

        self.status = HoldingStatus::Closed;
        self.close_price = Some(close_price);
        self.close_date = Some(close_date);

        Ok(ClosedPosition {
            realized_pnl,
            trade,
        })
    }
}

/// Build a holding id from its creation time, suffixing on collision.
pub fn next_holding_id(now: NaiveDateTime, existing: &[Holding]) -> String {
    let base = now.format("%Y%m%d%H%M%S").to_string();
    if !existing.iter().any(|h| h.id == base) {
        return base;
    }
    (1..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !existing.iter().any(|h| &h.id == candidate))
        .unwrap_or(base)
}
