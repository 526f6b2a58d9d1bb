use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

use parkguide::workflows::licensing::{
    ApprovalId, ApprovalRecord, ApprovalStore, DispatchError, Notification, NotificationSender,
    RenewalId, RenewalRecord, RenewalStore, StoreError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryApprovalStore {
    records: Mutex<HashMap<ApprovalId, ApprovalRecord>>,
}

impl ApprovalStore for InMemoryApprovalStore {
    fn insert(&self, record: ApprovalRecord) -> Result<ApprovalRecord, StoreError> {
        let mut guard = self.records.lock().expect("approval store mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn list(&self) -> Result<Vec<ApprovalRecord>, StoreError> {
        let guard = self.records.lock().expect("approval store mutex poisoned");
        let mut records: Vec<ApprovalRecord> = guard.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    fn fetch(&self, id: &ApprovalId) -> Result<Option<ApprovalRecord>, StoreError> {
        let guard = self.records.lock().expect("approval store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn with_record(
        &self,
        id: &ApprovalId,
        apply: &mut dyn FnMut(&mut ApprovalRecord),
    ) -> Result<ApprovalRecord, StoreError> {
        let mut guard = self.records.lock().expect("approval store mutex poisoned");
        let record = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        apply(record);
        Ok(record.clone())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryRenewalStore {
    records: Mutex<HashMap<RenewalId, RenewalRecord>>,
}

impl RenewalStore for InMemoryRenewalStore {
    fn insert(&self, record: RenewalRecord) -> Result<RenewalRecord, StoreError> {
        let mut guard = self.records.lock().expect("renewal store mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn list(&self) -> Result<Vec<RenewalRecord>, StoreError> {
        let guard = self.records.lock().expect("renewal store mutex poisoned");
        let mut records: Vec<RenewalRecord> = guard.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    fn fetch(&self, id: &RenewalId) -> Result<Option<RenewalRecord>, StoreError> {
        let guard = self.records.lock().expect("renewal store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn with_record(
        &self,
        id: &RenewalId,
        apply: &mut dyn FnMut(&mut RenewalRecord),
    ) -> Result<RenewalRecord, StoreError> {
        let mut guard = self.records.lock().expect("renewal store mutex poisoned");
        let record = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        apply(record);
        Ok(record.clone())
    }
}

/// Stand-in transport until the hosted email/SMS integration lands: logs the
/// dispatch and reports success so sweep bookkeeping can be exercised.
#[derive(Default)]
pub(crate) struct LoggingNotificationSender;

impl NotificationSender for LoggingNotificationSender {
    fn send(&self, notification: Notification) -> Result<(), DispatchError> {
        info!(
            channel = ?notification.channel,
            recipient = %notification.recipient,
            subject = %notification.subject,
            "notification dispatched"
        );
        Ok(())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
