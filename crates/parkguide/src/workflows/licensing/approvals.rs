use std::sync::Arc;

use super::clock::Clock;
use super::domain::{ApprovalId, ApprovalRecord, ApprovalStatus};
use super::stats::ApprovalStatsSnapshot;
use super::store::{ApprovalStore, StoreError};

/// Owns approval records and their review transitions.
pub struct ApprovalTracker<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: ApprovalStore> ApprovalTracker<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Immutable snapshot of every approval record.
    pub fn list(&self) -> Result<Vec<ApprovalRecord>, StoreError> {
        self.store.list()
    }

    pub fn fetch(&self, id: &ApprovalId) -> Result<Option<ApprovalRecord>, StoreError> {
        self.store.fetch(id)
    }

    pub fn insert(&self, record: ApprovalRecord) -> Result<ApprovalRecord, StoreError> {
        self.store.insert(record)
    }

    /// Apply a new review status and stamp `review_date`, all under the
    /// store's record lock.
    ///
    /// Transitions are deliberately unrestricted: a reviewer can reopen an
    /// approved application or reject it again.
    pub fn update_status(
        &self,
        id: &ApprovalId,
        new_status: ApprovalStatus,
        reviewed_by: Option<String>,
    ) -> Result<ApprovalRecord, StoreError> {
        let now = self.clock.now();
        self.store.with_record(id, &mut |record| {
            record.status = new_status;
            record.review_date = Some(now);
            if let Some(reviewer) = reviewed_by.as_deref() {
                record.reviewed_by = Some(reviewer.to_string());
            }
        })
    }

    /// Partition of all records by current status.
    pub fn stats_snapshot(&self) -> Result<ApprovalStatsSnapshot, StoreError> {
        let records = self.store.list()?;
        Ok(ApprovalStatsSnapshot::tally(&records))
    }
}
