//! Database Repository
//!
//! Data access for consortium clients, profit entries and admin users.
//! Statements run independently; there are no multi-statement transactions.

use chrono::NaiveDate;
use tracing::{debug, error};

use super::models::*;
use super::{DatabaseError, DbPool};

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Client repository
#[derive(Clone)]
pub struct ClientRepository {
    pool: DbPool,
}

impl ClientRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, client: CreateClient) -> Result<ClientRecord, DatabaseError> {
        let record = sqlx::query_as::<_, ClientRecord>(
            r#"
            INSERT INTO clients (name, invested, join_date, note, password_hash)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING *
            "#,
        )
        .bind(&client.name)
        .bind(client.invested)
        .bind(client.join_date)
        .bind(&client.note)
        .bind(&client.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DatabaseError::Duplicate(format!("client '{}' already exists", client.name))
            } else {
                error!("Failed to create client: {}", e);
                DatabaseError::QueryError(format!("Failed to create client: {}", e))
            }
        })?;

        debug!("Created client: {} ({})", record.id, record.name);
        Ok(record)
    }

    pub async fn get(&self, id: i64) -> Result<Option<ClientRecord>, DatabaseError> {
        sqlx::query_as::<_, ClientRecord>("SELECT * FROM clients WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to get client {}: {}", id, e);
                DatabaseError::QueryError(format!("Failed to get client: {}", e))
            })
    }

    /// Look up a client by name, case-insensitively. Names are unique under
    /// the same collation, so at most one row matches.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<ClientRecord>, DatabaseError> {
        sqlx::query_as::<_, ClientRecord>("SELECT * FROM clients WHERE name = ?1 COLLATE NOCASE")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to get client by name: {}", e);
                DatabaseError::QueryError(format!("Failed to get client: {}", e))
            })
    }

    /// All clients, in join order.
    pub async fn list(&self) -> Result<Vec<ClientRecord>, DatabaseError> {
        sqlx::query_as::<_, ClientRecord>("SELECT * FROM clients ORDER BY join_date, id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to list clients: {}", e);
                DatabaseError::QueryError(format!("Failed to list clients: {}", e))
            })
    }

    /// Returns `false` when no client has this id.
    pub async fn update(&self, id: i64, update: UpdateClient) -> Result<bool, DatabaseError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE clients
            SET name = ?1, invested = ?2, join_date = ?3, note = ?4,
                password_hash = COALESCE(?5, password_hash)
            WHERE id = ?6
            "#,
        )
        .bind(&update.name)
        .bind(update.invested)
        .bind(update.join_date)
        .bind(&update.note)
        .bind(&update.password_hash)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DatabaseError::Duplicate(format!("client '{}' already exists", update.name))
            } else {
                error!("Failed to update client {}: {}", id, e);
                DatabaseError::QueryError(format!("Failed to update client: {}", e))
            }
        })?
        .rows_affected();

        debug!("Updated client {}: {} row(s)", id, rows_affected);
        Ok(rows_affected > 0)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let rows_affected = sqlx::query("DELETE FROM clients WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete client {}: {}", id, e);
                DatabaseError::QueryError(format!("Failed to delete client: {}", e))
            })?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    pub async fn clear(&self) -> Result<u64, DatabaseError> {
        let rows_affected = sqlx::query("DELETE FROM clients")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to clear clients: {}", e);
                DatabaseError::QueryError(format!("Failed to clear clients: {}", e))
            })?
            .rows_affected();

        Ok(rows_affected)
    }
}

/// Profit repository
#[derive(Clone)]
pub struct ProfitRepository {
    pool: DbPool,
}

impl ProfitRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert the entry, or replace total and note if the date already exists.
    pub async fn upsert(&self, profit: UpsertProfit) -> Result<ProfitRecord, DatabaseError> {
        let record = sqlx::query_as::<_, ProfitRecord>(
            r#"
            INSERT INTO profits (profit_date, total_profit, note)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(profit_date) DO UPDATE SET
                total_profit = excluded.total_profit,
                note = excluded.note
            RETURNING *
            "#,
        )
        .bind(profit.profit_date)
        .bind(profit.total_profit)
        .bind(&profit.note)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to upsert profit for {}: {}", profit.profit_date, e);
            DatabaseError::QueryError(format!("Failed to upsert profit: {}", e))
        })?;

        debug!("Recorded profit {} on {}", record.total_profit, record.profit_date);
        Ok(record)
    }

    /// All entries, oldest first.
    pub async fn list(&self) -> Result<Vec<ProfitRecord>, DatabaseError> {
        sqlx::query_as::<_, ProfitRecord>("SELECT * FROM profits ORDER BY profit_date ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to list profits: {}", e);
                DatabaseError::QueryError(format!("Failed to list profits: {}", e))
            })
    }

    pub async fn get_by_date(&self, date: NaiveDate) -> Result<Option<ProfitRecord>, DatabaseError> {
        sqlx::query_as::<_, ProfitRecord>("SELECT * FROM profits WHERE profit_date = ?1")
            .bind(date)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to get profit for {}: {}", date, e);
                DatabaseError::QueryError(format!("Failed to get profit: {}", e))
            })
    }

    pub async fn delete_by_date(&self, date: NaiveDate) -> Result<bool, DatabaseError> {
        let rows_affected = sqlx::query("DELETE FROM profits WHERE profit_date = ?1")
            .bind(date)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete profit for {}: {}", date, e);
                DatabaseError::QueryError(format!("Failed to delete profit: {}", e))
            })?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    pub async fn clear(&self) -> Result<u64, DatabaseError> {
        let rows_affected = sqlx::query("DELETE FROM profits")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to clear profits: {}", e);
                DatabaseError::QueryError(format!("Failed to clear profits: {}", e))
            })?
            .rows_affected();

        Ok(rows_affected)
    }
}

/// Admin user repository
#[derive(Clone)]
pub struct AdminUserRepository {
    pool: DbPool,
}

impl AdminUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminUserRecord, DatabaseError> {
        sqlx::query_as::<_, AdminUserRecord>(
            "INSERT INTO admin_users (username, password_hash) VALUES (?1, ?2) RETURNING *",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DatabaseError::Duplicate(format!("admin user '{}' already exists", username))
            } else {
                error!("Failed to create admin user: {}", e);
                DatabaseError::QueryError(format!("Failed to create admin user: {}", e))
            }
        })
    }

    pub async fn get_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminUserRecord>, DatabaseError> {
        sqlx::query_as::<_, AdminUserRecord>("SELECT * FROM admin_users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to get admin user: {}", e);
                DatabaseError::QueryError(format!("Failed to get admin user: {}", e))
            })
    }
}
