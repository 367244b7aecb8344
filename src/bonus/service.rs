//! Bonus proposal rules
//!
//! List, search and create on top of a [`BonusStore`]. The month and name
//! checks in [`BonusService::create`] reject early; the store's unique index
//! stays the authority on monthly uniqueness.

use crate::bonus::store::BonusStore;
use crate::error::{name_mismatch_error, not_found_error, AppError};
use crate::models::{names_match, BonusProposal, CreateBonusRequest};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct BonusService {
    store: Arc<dyn BonusStore>,
}

impl BonusService {
    pub fn new(store: Arc<dyn BonusStore>) -> Self {
        Self { store }
    }

    /// Every proposal, newest proposal date first
    pub async fn list(&self) -> Result<Vec<BonusProposal>, AppError> {
        self.store.list_all().await
    }

    /// All proposals for one employee.
    ///
    /// When `employee_name` is given it must match the stored name of every
    /// record; a mismatch fails the whole search.
    pub async fn search(
        &self,
        employee_id: Option<&str>,
        employee_name: Option<&str>,
    ) -> Result<Vec<BonusProposal>, AppError> {
        let employee_id = employee_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::BadRequest("employeeID query parameter is required".to_string()))?;

        let proposals = self.store.find_by_employee(employee_id).await?;
        let Some(latest) = proposals.first() else {
            return Err(not_found_error(format!(
                "No bonus proposals found for employee {}",
                employee_id
            )));
        };

        if let Some(name) = employee_name.map(str::trim).filter(|n| !n.is_empty()) {
            if proposals.iter().any(|p| !names_match(&p.employee_name, name)) {
                warn!(
                    "Search name mismatch for {}: got '{}', stored '{}'",
                    employee_id, name, latest.employee_name
                );
                return Err(name_mismatch_error(employee_id, latest.employee_name.clone()));
            }
        }

        debug!("Found {} proposals for {}", proposals.len(), employee_id);
        Ok(proposals)
    }

    /// Validate and store a new proposal
    pub async fn create(&self, request: CreateBonusRequest) -> Result<BonusProposal, AppError> {
        let proposal = request.into_new_proposal()?;

        if let Some(existing) = self
            .store
            .find_in_month(&proposal.employee_id, proposal.proposal_date)
            .await?
        {
            warn!(
                "Proposal for {} in {} already exists (id {})",
                proposal.employee_id,
                proposal.proposal_date.format("%Y-%m"),
                existing.id
            );
            return Err(AppError::AlreadySubmitted {
                existing_id: existing.id,
                employee_name: existing.employee_name,
            });
        }

        if let Some(previous) = self
            .store
            .find_latest_for_employee(&proposal.employee_id)
            .await?
        {
            if !names_match(&previous.employee_name, &proposal.employee_name) {
                warn!(
                    "Name mismatch for {}: got '{}', stored '{}'",
                    proposal.employee_id, proposal.employee_name, previous.employee_name
                );
                return Err(name_mismatch_error(&proposal.employee_id, previous.employee_name));
            }
        }

        let created = self.store.insert(&proposal).await?;
        info!(
            "Bonus proposal created: {} for {} (id: {})",
            created.bonus_amount, created.employee_id, created.id
        );
        Ok(created)
    }

    /// Check that the store answers
    pub async fn health(&self) -> Result<(), AppError> {
        self.store.ping().await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bonus::memory::InMemoryBonusStore;
    use crate::models::NewBonusProposal;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    /// Store whose month lookup never sees existing rows, so concurrent
    /// creates race all the way to the insert
    pub(crate) struct RacingStore(pub InMemoryBonusStore);

    #[async_trait]
    impl BonusStore for RacingStore {
        async fn list_all(&self) -> Result<Vec<BonusProposal>, AppError> {
            self.0.list_all().await
        }

        async fn find_by_employee(&self, employee_id: &str) -> Result<Vec<BonusProposal>, AppError> {
            self.0.find_by_employee(employee_id).await
        }

        async fn find_in_month(
            &self,
            _employee_id: &str,
            _date: NaiveDate,
        ) -> Result<Option<BonusProposal>, AppError> {
            tokio::task::yield_now().await;
            Ok(None)
        }

        async fn find_latest_for_employee(
            &self,
            _employee_id: &str,
        ) -> Result<Option<BonusProposal>, AppError> {
            Ok(None)
        }

        async fn insert(&self, proposal: &NewBonusProposal) -> Result<BonusProposal, AppError> {
            self.0.insert(proposal).await
        }

        async fn ping(&self) -> Result<(), AppError> {
            self.0.ping().await
        }
    }

    pub(crate) fn create_request(id: &str, name: &str, date: &str, amount: i64) -> CreateBonusRequest {
        CreateBonusRequest {
            employee_name: Some(name.to_string()),
            employee_id: Some(id.to_string()),
            proposal_date: Some(date.to_string()),
            bonus_amount: Some(amount),
            reason: Some("Outstanding delivery on the billing rewrite".to_string()),
        }
    }

    fn service() -> BonusService {
        BonusService::new(Arc::new(InMemoryBonusStore::new()))
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_create_returns_input_with_id() {
        let service = service();
        let created = service
            .create(create_request("ATS0123", "Veera Raghava", "2025-04-24", 5000))
            .await
            .unwrap();

        assert_eq!(
            created,
            BonusProposal {
                id: 1,
                employee_name: "Veera Raghava".to_string(),
                employee_id: "ATS0123".to_string(),
                proposal_date: date("2025-04-24"),
                bonus_amount: 5000,
                reason: "Outstanding delivery on the billing rewrite".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_same_month_rejected_regardless_of_day() {
        let service = service();
        let first = service
            .create(create_request("ATS0123", "Veera Raghava", "2025-04-01", 5000))
            .await
            .unwrap();

        let err = service
            .create(create_request("ATS0123", "Veera Raghava", "2025-04-30", 700))
            .await
            .unwrap_err();

        match err {
            AppError::AlreadySubmitted {
                existing_id,
                employee_name,
            } => {
                assert_eq!(existing_id, first.id);
                assert_eq!(employee_name, "Veera Raghava");
            }
            other => panic!("expected AlreadySubmitted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_different_month_accepted() {
        let service = service();
        service
            .create(create_request("ATS0123", "Veera Raghava", "2025-04-24", 5000))
            .await
            .unwrap();
        service
            .create(create_request("ATS0123", "Veera Raghava", "2025-05-02", 5000))
            .await
            .unwrap();
        // Same month number, different year
        service
            .create(create_request("ATS0123", "Veera Raghava", "2026-04-24", 5000))
            .await
            .unwrap();

        assert_eq!(service.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_create_rejects_different_name_for_known_id() {
        let service = service();
        service
            .create(create_request("ATS0123", "Veera Raghava", "2025-04-24", 5000))
            .await
            .unwrap();

        let err = service
            .create(create_request("ATS0123", "Someone Else", "2025-05-10", 5000))
            .await
            .unwrap_err();
        match err {
            AppError::NameMismatch { correct_name, .. } => assert_eq!(correct_name, "Veera Raghava"),
            other => panic!("expected NameMismatch, got {:?}", other),
        }

        // Case differences are not a mismatch
        service
            .create(create_request("ATS0123", "VEERA raghava", "2025-05-10", 5000))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_month_conflict_reported_before_name_mismatch() {
        let service = service();
        service
            .create(create_request("ATS0123", "Veera Raghava", "2025-04-24", 5000))
            .await
            .unwrap();

        let err = service
            .create(create_request("ATS0123", "Wrong Name", "2025-04-25", 5000))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadySubmitted { .. }));
    }

    #[tokio::test]
    async fn test_validation_runs_before_store_access() {
        let store = Arc::new(InMemoryBonusStore::new());
        store.set_unavailable(true);
        let service = BonusService::new(store);

        let err = service
            .create(create_request("ATS0000", "Veera Raghava", "2025-04-24", 5000))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_orders_by_date_desc() {
        let service = service();
        for (id, d) in [("ATS0001", "2025-01-15"), ("ATS0002", "2025-03-01"), ("ATS0003", "2025-02-10")] {
            service
                .create(create_request(id, "Employee", d, 100))
                .await
                .unwrap();
        }

        let dates: Vec<_> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.proposal_date)
            .collect();
        assert_eq!(dates, vec![date("2025-03-01"), date("2025-02-10"), date("2025-01-15")]);
    }

    #[tokio::test]
    async fn test_search_requires_employee_id() {
        let service = service();
        assert!(matches!(
            service.search(None, None).await.unwrap_err(),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            service.search(Some("  "), None).await.unwrap_err(),
            AppError::BadRequest(_)
        ));
    }

    #[tokio::test]
    async fn test_search_not_found() {
        let service = service();
        assert!(matches!(
            service.search(Some("ATS0999"), None).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_search_returns_all_matches_newest_first() {
        let service = service();
        for d in ["2025-02-03", "2025-04-24", "2025-03-15"] {
            service
                .create(create_request("ATS0123", "Veera Raghava", d, 1000))
                .await
                .unwrap();
        }
        service
            .create(create_request("ATS0456", "Other Person", "2025-04-01", 1000))
            .await
            .unwrap();

        let found = service
            .search(Some("ATS0123"), Some("veera raghava"))
            .await
            .unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].proposal_date, date("2025-04-24"));
        assert!(found.iter().all(|p| p.employee_id == "ATS0123"));
    }

    #[tokio::test]
    async fn test_search_name_mismatch_reports_stored_name() {
        let service = service();
        service
            .create(create_request("ATS0123", "Veera Raghava", "2025-04-24", 5000))
            .await
            .unwrap();

        match service
            .search(Some("ATS0123"), Some("Wrong Name"))
            .await
            .unwrap_err()
        {
            AppError::NameMismatch { correct_name, .. } => assert_eq!(correct_name, "Veera Raghava"),
            other => panic!("expected NameMismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrent_creates_exactly_one_wins() {
        let service = BonusService::new(Arc::new(RacingStore(InMemoryBonusStore::new())));

        let (a, b) = tokio::join!(
            service.create(create_request("ATS0123", "Veera Raghava", "2025-04-24", 5000)),
            service.create(create_request("ATS0123", "Veera Raghava", "2025-04-28", 5000)),
        );

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AppError::DuplicateEntry))));
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_server_error() {
        let store = Arc::new(InMemoryBonusStore::new());
        let service = BonusService::new(store.clone());
        store.set_unavailable(true);

        let err = service.list().await.unwrap_err();
        assert!(err.status().is_server_error());
        assert!(service.health().await.is_err());
    }
}
