//! Bonus proposal storage
//!
//! The [`BonusStore`] trait is the seam between the proposal rules and the
//! database. [`PgBonusStore`] is the PostgreSQL implementation used by the
//! server.

use crate::db::queries;
use crate::error::{validation_error, AppError};
use crate::models::{BonusProposal, NewBonusProposal};
use async_trait::async_trait;
use chrono::NaiveDate;
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;
use tracing::{debug, warn};

/// Persistence operations needed by the proposal service
#[async_trait]
pub trait BonusStore: Send + Sync {
    /// All proposals, newest proposal date first
    async fn list_all(&self) -> Result<Vec<BonusProposal>, AppError>;

    /// All proposals for one employee, newest proposal date first
    async fn find_by_employee(&self, employee_id: &str) -> Result<Vec<BonusProposal>, AppError>;

    /// The proposal for `employee_id` in the calendar month of `date`, if any
    async fn find_in_month(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<BonusProposal>, AppError>;

    /// The most recent proposal for `employee_id`, if any
    async fn find_latest_for_employee(
        &self,
        employee_id: &str,
    ) -> Result<Option<BonusProposal>, AppError>;

    /// Insert a proposal.
    ///
    /// A monthly uniqueness violation must be reported as
    /// [`AppError::DuplicateEntry`].
    async fn insert(&self, proposal: &NewBonusProposal) -> Result<BonusProposal, AppError>;

    /// Round-trip to the store for health checks
    async fn ping(&self) -> Result<(), AppError>;
}

/// PostgreSQL-backed proposal store
pub struct PgBonusStore {
    pool: Pool,
}

impl PgBonusStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn row_to_proposal(row: &Row) -> BonusProposal {
    BonusProposal {
        id: row.get("id"),
        employee_name: row.get("employee_name"),
        employee_id: row.get("employee_id"),
        proposal_date: row.get("proposal_date"),
        bonus_amount: row.get("bonus_amount"),
        reason: row.get("reason"),
    }
}

/// Translate constraint violations on insert into client errors
fn map_insert_error(e: tokio_postgres::Error) -> AppError {
    match e.code() {
        Some(code) if *code == SqlState::UNIQUE_VIOLATION => {
            warn!("Insert rejected by unique constraint: {}", e);
            AppError::DuplicateEntry
        }
        Some(code) if *code == SqlState::CHECK_VIOLATION => {
            warn!("Insert rejected by check constraint: {}", e);
            validation_error("Proposal violates a data constraint (employeeID format or minimum bonusAmount)")
        }
        Some(code) if *code == SqlState::STRING_DATA_RIGHT_TRUNCATION => {
            validation_error("employeeName must be at most 100 characters")
        }
        _ => AppError::Database(e),
    }
}

#[async_trait]
impl BonusStore for PgBonusStore {
    async fn list_all(&self) -> Result<Vec<BonusProposal>, AppError> {
        let client = self.pool.get().await?;
        let rows = client.query(queries::LIST_PROPOSALS, &[]).await?;
        Ok(rows.iter().map(row_to_proposal).collect())
    }

    async fn find_by_employee(&self, employee_id: &str) -> Result<Vec<BonusProposal>, AppError> {
        let client = self.pool.get().await?;
        let rows = client.query(queries::FIND_BY_EMPLOYEE, &[&employee_id]).await?;
        Ok(rows.iter().map(row_to_proposal).collect())
    }

    async fn find_in_month(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<BonusProposal>, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(queries::FIND_IN_MONTH, &[&employee_id, &date])
            .await?;
        Ok(row.as_ref().map(row_to_proposal))
    }

    async fn find_latest_for_employee(
        &self,
        employee_id: &str,
    ) -> Result<Option<BonusProposal>, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(queries::FIND_LATEST_FOR_EMPLOYEE, &[&employee_id])
            .await?;
        Ok(row.as_ref().map(row_to_proposal))
    }

    async fn insert(&self, proposal: &NewBonusProposal) -> Result<BonusProposal, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                queries::INSERT_PROPOSAL,
                &[
                    &proposal.employee_name,
                    &proposal.employee_id,
                    &proposal.proposal_date,
                    &proposal.bonus_amount,
                    &proposal.reason,
                ],
            )
            .await
            .map_err(map_insert_error)?;

        let created = row_to_proposal(&row);
        debug!("Inserted bonus proposal row {}", created.id);
        Ok(created)
    }

    async fn ping(&self) -> Result<(), AppError> {
        let client = self.pool.get().await?;
        client.query_one(queries::PING, &[]).await?;
        Ok(())
    }
}
