//! Database Models
//!
//! Row types for the consortium tables and their conversion to domain types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::domain::entities::client::{Client, ProfitEntry};
use crate::domain::errors::ValidationError;
use crate::domain::value_objects::pnl::PnL;

/// Client record in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientRecord {
    pub id: i64,
    pub name: String,
    pub invested: f64,
    pub join_date: NaiveDate,
    pub note: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
}

impl From<ClientRecord> for Client {
    fn from(record: ClientRecord) -> Self {
        Client {
            id: record.id,
            name: record.name,
            invested: record.invested,
            join_date: record.join_date,
            note: record.note,
        }
    }
}

/// Profit record in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfitRecord {
    pub id: i64,
    pub profit_date: NaiveDate,
    pub total_profit: f64,
    pub note: String,
}

impl TryFrom<ProfitRecord> for ProfitEntry {
    type Error = ValidationError;

    fn try_from(record: ProfitRecord) -> Result<Self, Self::Error> {
        Ok(ProfitEntry {
            id: record.id,
            profit_date: record.profit_date,
            total_profit: PnL::new(record.total_profit)?,
            note: record.note,
        })
    }
}

/// Admin user record in database
#[derive(Debug, Clone, FromRow)]
pub struct AdminUserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

/// Create client input
#[derive(Debug, Clone)]
pub struct CreateClient {
    pub name: String,
    pub invested: f64,
    pub join_date: NaiveDate,
    pub note: String,
    pub password_hash: Option<String>,
}

/// Update client input; `password_hash` of `None` keeps the stored one
#[derive(Debug, Clone)]
pub struct UpdateClient {
    pub name: String,
    pub invested: f64,
    pub join_date: NaiveDate,
    pub note: String,
    pub password_hash: Option<String>,
}

/// Upsert profit input
#[derive(Debug, Clone)]
pub struct UpsertProfit {
    pub profit_date: NaiveDate,
    pub total_profit: f64,
    pub note: String,
}
