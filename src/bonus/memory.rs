//! In-memory proposal store for tests
//!
//! Enforces the same monthly uniqueness as the database index, atomically
//! under one lock.

use crate::bonus::store::BonusStore;
use crate::error::AppError;
use crate::models::{BonusProposal, NewBonusProposal};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
struct Table {
    rows: Vec<BonusProposal>,
    next_id: i32,
}

#[derive(Default)]
pub struct InMemoryBonusStore {
    table: Mutex<Table>,
    unavailable: AtomicBool,
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

fn newest_first(rows: &mut [BonusProposal]) {
    rows.sort_by_key(|p| Reverse((p.proposal_date, p.id)));
}

impl InMemoryBonusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail like a lost database connection
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Internal("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BonusStore for InMemoryBonusStore {
    async fn list_all(&self) -> Result<Vec<BonusProposal>, AppError> {
        self.check_available()?;
        let mut rows = self.table.lock().await.rows.clone();
        newest_first(&mut rows);
        Ok(rows)
    }

    async fn find_by_employee(&self, employee_id: &str) -> Result<Vec<BonusProposal>, AppError> {
        self.check_available()?;
        let mut rows: Vec<_> = self
            .table
            .lock()
            .await
            .rows
            .iter()
            .filter(|p| p.employee_id == employee_id)
            .cloned()
            .collect();
        newest_first(&mut rows);
        Ok(rows)
    }

    async fn find_in_month(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<BonusProposal>, AppError> {
        self.check_available()?;
        Ok(self
            .table
            .lock()
            .await
            .rows
            .iter()
            .find(|p| p.employee_id == employee_id && same_month(p.proposal_date, date))
            .cloned())
    }

    async fn find_latest_for_employee(
        &self,
        employee_id: &str,
    ) -> Result<Option<BonusProposal>, AppError> {
        Ok(self.find_by_employee(employee_id).await?.into_iter().next())
    }

    async fn insert(&self, proposal: &NewBonusProposal) -> Result<BonusProposal, AppError> {
        self.check_available()?;
        let mut table = self.table.lock().await;

        if table.rows.iter().any(|p| {
            p.employee_id == proposal.employee_id
                && same_month(p.proposal_date, proposal.proposal_date)
        }) {
            return Err(AppError::DuplicateEntry);
        }

        table.next_id += 1;
        let created = BonusProposal {
            id: table.next_id,
            employee_name: proposal.employee_name.clone(),
            employee_id: proposal.employee_id.clone(),
            proposal_date: proposal.proposal_date,
            bonus_amount: proposal.bonus_amount,
            reason: proposal.reason.clone(),
        };
        table.rows.push(created.clone());
        Ok(created)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.check_available()
    }
}
