use chrono::{Duration, TimeZone, Utc};

use super::common::base_now;
use crate::workflows::licensing::renewals::days_until_expiry;

#[test]
fn exact_day_offsets_round_trip() {
    let midnight = Utc
        .with_ymd_and_hms(2026, 3, 10, 0, 0, 0)
        .single()
        .expect("valid instant");

    for n in [-30i64, -3, -1, 0, 1, 5, 15, 30, 365] {
        let expiry = midnight.date_naive() + Duration::days(n);
        assert_eq!(days_until_expiry(expiry, midnight), n, "offset {n}");
    }
}

#[test]
fn partial_days_round_up_toward_expiry() {
    // 09:00 on the 10th; expiring ten calendar days out still reads as 10.
    let now = base_now();
    let expiry = now.date_naive() + Duration::days(10);
    assert_eq!(days_until_expiry(expiry, now), 10);
}

#[test]
fn expiring_today_reads_zero() {
    let now = base_now();
    assert_eq!(days_until_expiry(now.date_naive(), now), 0);
}

#[test]
fn expired_yesterday_reads_negative() {
    let now = base_now();
    let expiry = now.date_naive() - Duration::days(1);
    assert_eq!(days_until_expiry(expiry, now), -1);

    let expiry = now.date_naive() - Duration::days(3);
    assert_eq!(days_until_expiry(expiry, now), -3);
}
