//! License lifecycle and renewal alerting engine.
//!
//! Approval records move through review, renewal records track expiry and
//! payment, and a periodic sweep dispatches staged reminders at the fixed
//! 30/15/5 day checkpoints, each at most once per renewal. Storage and
//! notification transport are injected capabilities so the engine can run
//! against any backing service.

pub mod approvals;
pub mod clock;
pub mod domain;
pub mod renewals;
pub mod router;
pub mod scheduler;
pub mod service;
pub mod stats;
pub mod store;

#[cfg(test)]
mod tests;

pub use approvals::ApprovalTracker;
pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    generate_license_number, AlertThreshold, ApprovalId, ApprovalRecord, ApprovalStatus,
    LicenseKind, RenewalId, RenewalPriority, RenewalRecord, RenewalView, ValidationError,
    ALERT_THRESHOLDS, RENEWED_STATUS, RENEW_REQUIRED_STATUS, UNPAID_PAYMENT_STATES,
};
pub use renewals::{days_until_expiry, due_thresholds, is_alert_due, RenewalTracker};
pub use router::licensing_router;
pub use scheduler::{AlertScheduler, SchedulerHandle, SweepOutcome, SweepReport};
pub use service::{BulkRenewOutcome, LicensingService, LicensingServiceError};
pub use stats::{ApprovalStatsSnapshot, LicenseStats, RenewalStatsSnapshot};
pub use store::{
    ApprovalStore, DispatchError, Notification, NotificationChannel, NotificationSender,
    RenewalStore, StoreError,
};
