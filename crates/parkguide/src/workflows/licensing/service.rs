use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::approvals::ApprovalTracker;
use super::clock::Clock;
use super::domain::{
    ApprovalId, ApprovalRecord, ApprovalStatus, LicenseKind, RenewalId, RenewalRecord,
    ValidationError,
};
use super::renewals::RenewalTracker;
use super::scheduler::{AlertScheduler, SchedulerHandle, SweepOutcome};
use super::stats::LicenseStats;
use super::store::{
    ApprovalStore, Notification, NotificationChannel, NotificationSender, RenewalStore, StoreError,
};

/// Facade composing the trackers, scheduler, and notification capability
/// behind the operations the presentation layer consumes.
pub struct LicensingService<AS, RS, N> {
    approvals: ApprovalTracker<AS>,
    renewals: Arc<RenewalTracker<RS>>,
    scheduler: Arc<AlertScheduler<RS, N>>,
    sender: Arc<N>,
}

impl<AS, RS, N> LicensingService<AS, RS, N>
where
    AS: ApprovalStore + 'static,
    RS: RenewalStore + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(
        approval_store: Arc<AS>,
        renewal_store: Arc<RS>,
        sender: Arc<N>,
        clock: Arc<dyn Clock>,
        dispatch_timeout: Duration,
    ) -> Self {
        let approvals = ApprovalTracker::new(approval_store, Arc::clone(&clock));
        let renewals = Arc::new(RenewalTracker::new(renewal_store, clock));
        let scheduler = Arc::new(AlertScheduler::new(
            Arc::clone(&renewals),
            Arc::clone(&sender),
            dispatch_timeout,
        ));

        Self {
            approvals,
            renewals,
            scheduler,
            sender,
        }
    }

    pub fn approvals(&self) -> &ApprovalTracker<AS> {
        &self.approvals
    }

    pub fn renewals(&self) -> &RenewalTracker<RS> {
        &self.renewals
    }

    pub fn list_approvals(&self) -> Result<Vec<ApprovalRecord>, LicensingServiceError> {
        Ok(self.approvals.list()?)
    }

    pub fn list_renewals(&self) -> Result<Vec<RenewalRecord>, LicensingServiceError> {
        Ok(self.renewals.list()?)
    }

    /// Apply a reviewed status token to an application. The token is
    /// validated before any mutation; unknown ids surface as `NotFound`.
    pub fn update_approval_status(
        &self,
        id: &ApprovalId,
        status_token: &str,
        reviewed_by: Option<String>,
    ) -> Result<ApprovalRecord, LicensingServiceError> {
        let status = ApprovalStatus::parse(status_token)?;
        Ok(self.approvals.update_status(id, status, reviewed_by)?)
    }

    pub fn update_payment_status(
        &self,
        id: &RenewalId,
        payment: &str,
    ) -> Result<RenewalRecord, LicensingServiceError> {
        Ok(self.renewals.update_payment(id, payment)?)
    }

    /// Issue a license: an approval moves to `approved`, a renewal becomes
    /// `Renewed` and receives its license number. A courtesy notification
    /// goes out through the injected sender; its failure is logged but never
    /// fails the command.
    pub fn send_license(
        &self,
        kind: LicenseKind,
        id: &str,
    ) -> Result<(), LicensingServiceError> {
        let notification = match kind {
            LicenseKind::Approval => {
                let record = self.approvals.update_status(
                    &ApprovalId(id.to_string()),
                    ApprovalStatus::Approved,
                    None,
                )?;
                Notification {
                    channel: NotificationChannel::Email,
                    recipient: record.user_name.clone(),
                    subject: "Park guide license approved".to_string(),
                    body: format!(
                        "Hi {}, your park guide license application has been approved.",
                        record.user_name
                    ),
                }
            }
            LicenseKind::Renewal => {
                let record = self.renewals.mark_renewed(&RenewalId(id.to_string()))?;
                let number = record.license_number.as_deref().unwrap_or("pending");
                Notification {
                    channel: NotificationChannel::Email,
                    recipient: record.user_name.clone(),
                    subject: "Park guide license renewed".to_string(),
                    body: format!(
                        "Hi {}, your park guide license has been renewed. License number: {number}.",
                        record.user_name
                    ),
                }
            }
        };

        if let Err(err) = self.sender.send(notification) {
            warn!(%err, "license issuance notification failed");
        }
        Ok(())
    }

    /// Renew every eligible record in the selection; expired or unpaid
    /// records are skipped, and unknown ids count as skipped rather than
    /// failing the whole batch.
    pub fn bulk_renew(
        &self,
        ids: &[RenewalId],
    ) -> Result<BulkRenewOutcome, LicensingServiceError> {
        let mut updated = Vec::new();
        let mut skipped = Vec::new();

        for id in ids {
            match self.renewals.fetch(id)? {
                Some(record) if record.is_eligible_for_renewal() => {
                    self.renewals.mark_renewed(id)?;
                    updated.push(id.clone());
                }
                _ => skipped.push(id.clone()),
            }
        }

        let message = bulk_renew_message(updated.len(), skipped.len());
        Ok(BulkRenewOutcome {
            updated,
            skipped,
            message,
        })
    }

    /// Dashboard summary over both trackers.
    pub fn license_stats(&self) -> Result<LicenseStats, LicensingServiceError> {
        Ok(LicenseStats::compose(
            self.approvals.stats_snapshot()?,
            self.renewals.stats_snapshot()?,
        ))
    }

    /// Run one alert sweep now, outside the timer cadence.
    pub async fn run_sweep(&self) -> Result<SweepOutcome, LicensingServiceError> {
        Ok(self.scheduler.run_sweep().await?)
    }

    /// Start the periodic sweep loop; see [`SchedulerHandle::stop`].
    pub fn start_scheduler(&self, interval: Duration) -> SchedulerHandle {
        Arc::clone(&self.scheduler).start(interval)
    }
}

/// Result of a checkbox-driven bulk renewal.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BulkRenewOutcome {
    pub updated: Vec<RenewalId>,
    pub skipped: Vec<RenewalId>,
    pub message: String,
}

fn bulk_renew_message(updated: usize, skipped: usize) -> String {
    let mut message = String::new();
    if updated > 0 {
        let _ = write!(message, "{updated} license(s) renewed successfully.");
    }
    if skipped > 0 {
        if !message.is_empty() {
            message.push(' ');
        }
        let _ = write!(
            message,
            "{skipped} item(s) skipped because they are expired, unpaid, or unknown."
        );
    }
    if message.is_empty() {
        message.push_str("No licenses selected for renewal.");
    }
    message
}

/// Error raised by the licensing facade.
#[derive(Debug, thiserror::Error)]
pub enum LicensingServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
