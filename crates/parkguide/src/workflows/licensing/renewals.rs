use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::clock::Clock;
use super::domain::{
    generate_license_number, AlertThreshold, RenewalId, RenewalRecord, ALERT_THRESHOLDS,
    RENEWED_STATUS,
};
use super::stats::RenewalStatsSnapshot;
use super::store::{RenewalStore, StoreError};

const SECONDS_PER_DAY: i64 = 86_400;

/// Canonical day-precision distance from `now` to the expiry date, rounded
/// up: negative means already expired, zero means expiring today.
///
/// Any `days_until_expiry` cached on a record is only a snapshot of this
/// function; decision paths recompute it before acting.
pub fn days_until_expiry(expired_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let expiry = expired_date.and_time(NaiveTime::MIN).and_utc();
    let seconds = expiry.signed_duration_since(now).num_seconds();
    let whole_days = seconds.div_euclid(SECONDS_PER_DAY);
    if seconds.rem_euclid(SECONDS_PER_DAY) == 0 {
        whole_days
    } else {
        whole_days + 1
    }
}

/// Every checkpoint that is satisfied and not yet sent, soonest first, so a
/// missed sweep catches up in proximity order with one reminder per missing
/// checkpoint.
pub fn due_thresholds(record: &RenewalRecord) -> Vec<AlertThreshold> {
    let days = record.days_until_expiry;
    let mut due: Vec<AlertThreshold> = ALERT_THRESHOLDS
        .iter()
        .copied()
        .filter(|threshold| {
            days > 0 && days <= threshold.days() && !record.email_alerts_sent.contains(threshold)
        })
        .collect();
    due.sort();
    due
}

/// True while at least one reminder checkpoint is satisfied and unsent.
pub fn is_alert_due(record: &RenewalRecord) -> bool {
    !due_thresholds(record).is_empty()
}

/// Owns renewal records: expiry math, reminder bookkeeping, and payment and
/// renewal state.
pub struct RenewalTracker<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: RenewalStore> RenewalTracker<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Snapshot of every renewal record with `days_until_expiry` refreshed
    /// against the injected clock.
    pub fn list(&self) -> Result<Vec<RenewalRecord>, StoreError> {
        let now = self.clock.now();
        let mut records = self.store.list()?;
        for record in &mut records {
            record.days_until_expiry = days_until_expiry(record.expired_date, now);
        }
        Ok(records)
    }

    pub fn fetch(&self, id: &RenewalId) -> Result<Option<RenewalRecord>, StoreError> {
        let now = self.clock.now();
        let mut record = self.store.fetch(id)?;
        if let Some(record) = record.as_mut() {
            record.days_until_expiry = days_until_expiry(record.expired_date, now);
        }
        Ok(record)
    }

    pub fn insert(&self, mut record: RenewalRecord) -> Result<RenewalRecord, StoreError> {
        record.days_until_expiry = days_until_expiry(record.expired_date, self.clock.now());
        self.store.insert(record)
    }

    /// Record that the reminder for one checkpoint went out. Idempotent:
    /// marking an already-sent checkpoint is a no-op, and the sent set never
    /// shrinks.
    pub fn mark_alert_sent(
        &self,
        id: &RenewalId,
        threshold: AlertThreshold,
    ) -> Result<RenewalRecord, StoreError> {
        self.store.with_record(id, &mut |record| {
            record.email_alerts_sent.insert(threshold);
        })
    }

    pub fn update_payment(&self, id: &RenewalId, payment: &str) -> Result<RenewalRecord, StoreError> {
        self.store.with_record(id, &mut |record| {
            record.payment = payment.to_string();
        })
    }

    /// Move the renewal to its terminal `Renewed` state, assigning a license
    /// number on first issuance.
    pub fn mark_renewed(&self, id: &RenewalId) -> Result<RenewalRecord, StoreError> {
        let now = self.clock.now();
        self.store.with_record(id, &mut |record| {
            record.status = RENEWED_STATUS.to_string();
            if record.license_number.is_none() {
                record.license_number = Some(generate_license_number(&record.user_name, now));
            }
        })
    }

    /// Independent tallies over a freshly recomputed snapshot.
    pub fn stats_snapshot(&self) -> Result<RenewalStatsSnapshot, StoreError> {
        let records = self.list()?;
        Ok(RenewalStatsSnapshot::tally(&records))
    }
}
