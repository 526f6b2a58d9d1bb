use std::sync::Arc;

use super::common::{fixed_clock, renewal, MemoryRenewalStore};
use crate::workflows::licensing::domain::{AlertThreshold, RenewalId};
use crate::workflows::licensing::renewals::{due_thresholds, is_alert_due, RenewalTracker};
use crate::workflows::licensing::store::StoreError;

fn refreshed(days: i64, sent: &[AlertThreshold]) -> crate::workflows::licensing::RenewalRecord {
    let mut record = renewal("r-1", "Aina Binti Rahman", days, sent);
    record.days_until_expiry = days;
    record
}

#[test]
fn missed_sweep_reports_every_unsent_threshold_soonest_first() {
    let record = refreshed(10, &[]);
    assert_eq!(
        due_thresholds(&record),
        vec![AlertThreshold::FifteenDays, AlertThreshold::ThirtyDays]
    );

    let record = refreshed(3, &[]);
    assert_eq!(
        due_thresholds(&record),
        vec![
            AlertThreshold::FiveDays,
            AlertThreshold::FifteenDays,
            AlertThreshold::ThirtyDays
        ]
    );
}

#[test]
fn sent_thresholds_never_fire_again() {
    // Scenario: ten days out with the 30-day reminder already sent.
    let record = refreshed(10, &[AlertThreshold::ThirtyDays]);
    assert!(is_alert_due(&record));
    assert_eq!(due_thresholds(&record), vec![AlertThreshold::FifteenDays]);

    let record = refreshed(
        10,
        &[AlertThreshold::ThirtyDays, AlertThreshold::FifteenDays],
    );
    assert!(!is_alert_due(&record), "quiet until five days out");

    let record = refreshed(
        4,
        &[AlertThreshold::ThirtyDays, AlertThreshold::FifteenDays],
    );
    assert_eq!(due_thresholds(&record), vec![AlertThreshold::FiveDays]);
}

#[test]
fn expired_and_expiring_today_never_alert() {
    assert!(!is_alert_due(&refreshed(-3, &[])));
    assert!(!is_alert_due(&refreshed(0, &[])));
}

#[test]
fn threshold_boundaries_are_inclusive() {
    assert_eq!(due_thresholds(&refreshed(30, &[])).last(), Some(&AlertThreshold::ThirtyDays));
    assert!(due_thresholds(&refreshed(31, &[])).is_empty());
    assert_eq!(due_thresholds(&refreshed(5, &[])).first(), Some(&AlertThreshold::FiveDays));
}

#[test]
fn all_thresholds_sent_means_quiet() {
    let record = refreshed(
        2,
        &[
            AlertThreshold::ThirtyDays,
            AlertThreshold::FifteenDays,
            AlertThreshold::FiveDays,
        ],
    );
    assert!(!is_alert_due(&record));
}

#[test]
fn mark_alert_sent_is_idempotent_and_monotonic() {
    let store = Arc::new(MemoryRenewalStore::default());
    let tracker = RenewalTracker::new(Arc::clone(&store), fixed_clock());
    tracker
        .insert(renewal("r-9", "Jon Tan", 12, &[AlertThreshold::ThirtyDays]))
        .expect("insert renewal");

    let id = RenewalId("r-9".to_string());
    let record = tracker
        .mark_alert_sent(&id, AlertThreshold::FifteenDays)
        .expect("mark fifteen");
    assert_eq!(record.email_alerts_sent.len(), 2);

    // Marking again neither errors nor shrinks the set.
    let record = tracker
        .mark_alert_sent(&id, AlertThreshold::FifteenDays)
        .expect("idempotent mark");
    assert_eq!(record.email_alerts_sent.len(), 2);
    assert!(record
        .email_alerts_sent
        .contains(&AlertThreshold::ThirtyDays));
}

#[test]
fn mark_alert_sent_requires_known_record() {
    let store = Arc::new(MemoryRenewalStore::default());
    let tracker = RenewalTracker::new(store, fixed_clock());

    match tracker.mark_alert_sent(&RenewalId("ghost".to_string()), AlertThreshold::FiveDays) {
        Err(StoreError::NotFound) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn list_refreshes_stale_cached_expiry() {
    let store = Arc::new(MemoryRenewalStore::default());
    let tracker = RenewalTracker::new(Arc::clone(&store), fixed_clock());
    // Fixture seeds days_until_expiry with a stale sentinel.
    tracker
        .insert(renewal("r-2", "Mei Ling", 10, &[]))
        .expect("insert renewal");

    let records = tracker.list().expect("list renewals");
    assert_eq!(records[0].days_until_expiry, 10);
}
