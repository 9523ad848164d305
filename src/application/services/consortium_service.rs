//! Consortium workflows over the SQLite store.
//!
//! Rows are read through the repositories, converted to domain types, and fed
//! to the allocator. Nothing is cached between calls.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::ServiceError;
use crate::domain::entities::client::{Client, ClientDraft, ProfitEntry};
use crate::domain::errors::JournalError;
use crate::domain::services::allocation::{
    allocate, allocation_series, pool_summary, Allocation, AllocationSeries, ClientPerformance,
    PoolSummary,
};
use crate::domain::value_objects::pnl::PnL;
use crate::persistence::models::{CreateClient, UpdateClient, UpsertProfit};
use crate::persistence::repository::{AdminUserRepository, ClientRepository, ProfitRepository};
use crate::persistence::{DatabaseError, DbPool};
use crate::secrets::{hash_password, verify_password};

/// Client fields accepted from callers.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInput {
    pub name: String,
    pub invested: f64,
    pub join_date: NaiveDate,
    #[serde(default)]
    pub note: String,
    /// Enables client login when set
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfitInput {
    pub profit_date: NaiveDate,
    pub total_profit: f64,
    #[serde(default)]
    pub note: String,
}

/// One profit date split across the roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAllocation {
    pub date: NaiveDate,
    pub total_profit: f64,
    pub allocations: Vec<Allocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsortiumReport {
    pub summary: PoolSummary,
    #[serde(flatten)]
    pub series: AllocationSeries,
}

/// A stored hash that cannot be read counts as a failed login.
fn password_matches(password: &str, stored: &str, who: &str) -> bool {
    match verify_password(password, stored) {
        Ok(matches) => matches,
        Err(e) => {
            warn!("Unusable password hash for '{}': {}", who, e);
            false
        }
    }
}

#[derive(Clone)]
pub struct ConsortiumService {
    clients: ClientRepository,
    profits: ProfitRepository,
    admins: AdminUserRepository,
}

impl ConsortiumService {
    pub fn new(pool: DbPool) -> Self {
        Self {
            clients: ClientRepository::new(pool.clone()),
            profits: ProfitRepository::new(pool.clone()),
            admins: AdminUserRepository::new(pool),
        }
    }

    pub async fn add_client(&self, input: ClientInput) -> Result<Client, ServiceError> {
        let draft = ClientDraft::new(&input.name, input.invested, input.join_date, &input.note)?;
        let password_hash = input.password.as_deref().map(hash_password).transpose()?;
        let record = self
            .clients
            .create(CreateClient {
                name: draft.name,
                invested: draft.invested,
                join_date: draft.join_date,
                note: draft.note,
                password_hash,
            })
            .await?;

        info!("Added client {} ({}) investing {:.2}", record.id, record.name, record.invested);
        Ok(record.into())
    }

    /// Overwrite a client's fields. A missing password keeps the stored one.
    pub async fn update_client(&self, id: i64, input: ClientInput) -> Result<Client, ServiceError> {
        let draft = ClientDraft::new(&input.name, input.invested, input.join_date, &input.note)?;
        let password_hash = input.password.as_deref().map(hash_password).transpose()?;
        let updated = self
            .clients
            .update(
                id,
                UpdateClient {
                    name: draft.name,
                    invested: draft.invested,
                    join_date: draft.join_date,
                    note: draft.note,
                    password_hash,
                },
            )
            .await?;
        if !updated {
            return Err(JournalError::ClientNotFound(id).into());
        }

        let record = self
            .clients
            .get(id)
            .await?
            .ok_or(JournalError::ClientNotFound(id))?;
        info!("Updated client {}", id);
        Ok(record.into())
    }

    pub async fn delete_client(&self, id: i64) -> Result<(), ServiceError> {
        if !self.clients.delete(id).await? {
            return Err(JournalError::ClientNotFound(id).into());
        }
        info!("Deleted client {}", id);
        Ok(())
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, ServiceError> {
        Ok(self
            .clients
            .list()
            .await?
            .into_iter()
            .map(Client::from)
            .collect())
    }

    /// Record the pool's result for a date, replacing any earlier entry.
    pub async fn record_profit(&self, input: ProfitInput) -> Result<ProfitEntry, ServiceError> {
        let total_profit = PnL::new(input.total_profit)?;
        let record = self
            .profits
            .upsert(UpsertProfit {
                profit_date: input.profit_date,
                total_profit: total_profit.value(),
                note: input.note,
            })
            .await?;

        info!("Recorded pool result {} for {}", total_profit, record.profit_date);
        Ok(ProfitEntry::try_from(record)?)
    }

    pub async fn delete_profit(&self, date: NaiveDate) -> Result<(), ServiceError> {
        if !self.profits.delete_by_date(date).await? {
            return Err(JournalError::ProfitNotFound(date).into());
        }
        info!("Deleted pool result for {}", date);
        Ok(())
    }

    pub async fn list_profits(&self) -> Result<Vec<ProfitEntry>, ServiceError> {
        let entries = self
            .profits
            .list()
            .await?
            .into_iter()
            .map(ProfitEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Split the result recorded for `date` across the current roster.
    pub async fn allocations_for(&self, date: NaiveDate) -> Result<DailyAllocation, ServiceError> {
        let entry = self
            .profits
            .get_by_date(date)
            .await?
            .ok_or(JournalError::ProfitNotFound(date))?;
        let clients = self.list_clients().await?;

        Ok(DailyAllocation {
            date,
            total_profit: entry.total_profit,
            allocations: allocate(date, entry.total_profit, &clients),
        })
    }

    pub async fn performance(&self) -> Result<ConsortiumReport, ServiceError> {
        let clients = self.list_clients().await?;
        let profits = self.list_profits().await?;

        Ok(ConsortiumReport {
            summary: pool_summary(&clients, &profits),
            series: allocation_series(&profits, &clients),
        })
    }

    pub async fn clear_clients(&self) -> Result<u64, ServiceError> {
        let removed = self.clients.clear().await?;
        info!("Cleared {} client(s)", removed);
        Ok(removed)
    }

    pub async fn clear_profits(&self) -> Result<u64, ServiceError> {
        let removed = self.profits.clear().await?;
        info!("Cleared {} profit entr(ies)", removed);
        Ok(removed)
    }

    /// Create the admin user if it does not exist yet. Returns whether one was created.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, ServiceError> {
        if self.admins.get_by_username(username).await?.is_some() {
            return Ok(false);
        }
        match self.admins.create(username, &hash_password(password)?).await {
            Ok(_) => {
                info!("✓ Created consortium admin '{}'", username);
                Ok(true)
            }
            // Lost a race with another writer; the user exists either way.
            Err(DatabaseError::Duplicate(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn verify_admin(&self, username: &str, password: &str) -> Result<(), ServiceError> {
        let admin = self
            .admins
            .get_by_username(username)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if password_matches(password, &admin.password_hash, username) {
            Ok(())
        } else {
            warn!("Failed consortium admin login for '{}'", username);
            Err(ServiceError::InvalidCredentials)
        }
    }

    /// Authenticate a client by name and return only that client's performance.
    pub async fn verify_client(
        &self,
        name: &str,
        password: &str,
    ) -> Result<ClientPerformance, ServiceError> {
        let record = self
            .clients
            .get_by_name(name.trim())
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        let valid = record
            .password_hash
            .as_deref()
            .map(|hash| password_matches(password, hash, name))
            .unwrap_or(false);
        if !valid {
            warn!("Failed client login for '{}'", name);
            return Err(ServiceError::InvalidCredentials);
        }

        let id = record.id;
        let report = self.performance().await?;
        report
            .series
            .performance
            .into_iter()
            .find(|p| p.client_id == id)
            .ok_or_else(|| JournalError::ClientNotFound(id).into())
    }
}
