use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::workflows::licensing::clock::FixedClock;
use crate::workflows::licensing::domain::{
    AlertThreshold, ApprovalId, ApprovalRecord, ApprovalStatus, RenewalId, RenewalRecord,
};
use crate::workflows::licensing::service::LicensingService;
use crate::workflows::licensing::store::{
    ApprovalStore, DispatchError, Notification, NotificationSender, RenewalStore, StoreError,
};

/// Fixed "now" shared by the fixtures: 2026-03-10 09:00 UTC.
pub(super) fn base_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0)
        .single()
        .expect("valid fixture instant")
}

pub(super) fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(base_now()))
}

#[derive(Default)]
pub(super) struct MemoryApprovalStore {
    records: Mutex<HashMap<ApprovalId, ApprovalRecord>>,
}

impl ApprovalStore for MemoryApprovalStore {
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
pub(super) struct MemoryRenewalStore {
    records: Mutex<HashMap<RenewalId, RenewalRecord>>,
}

impl RenewalStore for MemoryRenewalStore {
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

/// Sender that records everything it is asked to deliver.
#[derive(Default)]
pub(super) struct RecordingSender {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingSender {
    pub(super) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("sender mutex poisoned").clone()
    }
}

impl NotificationSender for RecordingSender {
    fn send(&self, notification: Notification) -> Result<(), DispatchError> {
        self.sent
            .lock()
            .expect("sender mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Sender that fails for selected recipients and records the rest.
#[derive(Default)]
pub(super) struct FailingSender {
    pub(super) fail_for: Vec<String>,
    sent: Mutex<Vec<Notification>>,
}

impl FailingSender {
    pub(super) fn failing_for(recipient: &str) -> Self {
        Self {
            fail_for: vec![recipient.to_string()],
            sent: Mutex::default(),
        }
    }

    pub(super) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("sender mutex poisoned").clone()
    }
}

impl NotificationSender for FailingSender {
    fn send(&self, notification: Notification) -> Result<(), DispatchError> {
        if self.fail_for.contains(&notification.recipient) {
            return Err(DispatchError::Transport("simulated outage".to_string()));
        }
        self.sent
            .lock()
            .expect("sender mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Sender that blocks long enough to trip the dispatch timeout.
pub(super) struct SlowSender {
    pub(super) delay: Duration,
}

impl NotificationSender for SlowSender {
    fn send(&self, _notification: Notification) -> Result<(), DispatchError> {
        std::thread::sleep(self.delay);
        Ok(())
    }
}

pub(super) fn approval(id: &str, user_name: &str, status: ApprovalStatus) -> ApprovalRecord {
    ApprovalRecord {
        id: ApprovalId(id.to_string()),
        user_name: user_name.to_string(),
        course: "Completed".to_string(),
        mentor_programme: "Completed".to_string(),
        exam: "Pass".to_string(),
        status,
        date_submitted: base_now() - chrono::Duration::days(7),
        reviewed_by: None,
        review_date: None,
    }
}

/// Renewal expiring `expires_in_days` after the fixture clock, with the
/// given checkpoints already marked. The cached expiry distance is seeded
/// stale on purpose so refresh paths are observable.
pub(super) fn renewal(
    id: &str,
    user_name: &str,
    expires_in_days: i64,
    alerts_sent: &[AlertThreshold],
) -> RenewalRecord {
    RenewalRecord {
        id: RenewalId(id.to_string()),
        user_name: user_name.to_string(),
        start_date: base_now().date_naive() - chrono::Duration::days(365),
        expired_date: base_now().date_naive() + chrono::Duration::days(expires_in_days),
        payment: "Paid".to_string(),
        status: "Active".to_string(),
        days_until_expiry: 9_999,
        renewal_fee: 150,
        email_alerts_sent: alerts_sent.iter().copied().collect::<BTreeSet<_>>(),
        license_number: None,
    }
}

pub(super) type TestService =
    LicensingService<MemoryApprovalStore, MemoryRenewalStore, RecordingSender>;

pub(super) struct TestHarness {
    pub(super) approvals: Arc<MemoryApprovalStore>,
    pub(super) renewals: Arc<MemoryRenewalStore>,
    pub(super) sender: Arc<RecordingSender>,
    pub(super) service: TestService,
}

pub(super) fn harness() -> TestHarness {
    let approvals = Arc::new(MemoryApprovalStore::default());
    let renewals = Arc::new(MemoryRenewalStore::default());
    let sender = Arc::new(RecordingSender::default());
    let service = LicensingService::new(
        Arc::clone(&approvals),
        Arc::clone(&renewals),
        Arc::clone(&sender),
        fixed_clock(),
        Duration::from_secs(2),
    );

    TestHarness {
        approvals,
        renewals,
        sender,
        service,
    }
}

/// Checks the `PG-YYYYMM-INITIALS-NNN` shape without a regex dependency.
pub(super) fn assert_license_number_shape(number: &str) {
    let parts: Vec<&str> = number.split('-').collect();
    assert_eq!(parts.len(), 4, "unexpected segment count in {number}");
    assert_eq!(parts[0], "PG");
    assert_eq!(parts[1].len(), 6);
    assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
    assert!(!parts[2].is_empty());
    assert!(parts[2].chars().all(|c| c.is_ascii_uppercase()));
    assert_eq!(parts[3].len(), 3);
    assert!(parts[3].chars().all(|c| c.is_ascii_digit()));
}
