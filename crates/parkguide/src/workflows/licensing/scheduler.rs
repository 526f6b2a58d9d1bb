use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::domain::{AlertThreshold, RenewalRecord};
use super::renewals::{due_thresholds, RenewalTracker};
use super::store::{
    DispatchError, Notification, NotificationChannel, NotificationSender, RenewalStore, StoreError,
};

/// Result of asking the scheduler to sweep: either the sweep ran, or a sweep
/// was already in flight and this tick was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed(SweepReport),
    Skipped,
}

/// Per-sweep accounting, surfaced in logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Renewal records examined.
    pub scanned: usize,
    /// Reminders dispatched and marked sent.
    pub dispatched: usize,
    /// Dispatch failures left unmarked for the next sweep.
    pub failed: usize,
}

/// Periodic sweep over all renewals: recompute expiry distance, find the
/// due reminder checkpoints, dispatch notifications, and record successes.
///
/// Runs as `Idle -> Sweeping -> Idle`; a tick that lands while a sweep is
/// still in flight is skipped rather than overlapped.
pub struct AlertScheduler<S, N> {
    renewals: Arc<RenewalTracker<S>>,
    sender: Arc<N>,
    dispatch_timeout: Duration,
    sweeping: AtomicBool,
}

impl<S, N> AlertScheduler<S, N>
where
    S: RenewalStore + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(
        renewals: Arc<RenewalTracker<S>>,
        sender: Arc<N>,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            renewals,
            sender,
            dispatch_timeout,
            sweeping: AtomicBool::new(false),
        }
    }

    /// Entry point for both the timer loop and manual triggering.
    pub async fn run_sweep(&self) -> Result<SweepOutcome, StoreError> {
        if self
            .sweeping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("renewal sweep already in progress; skipping this tick");
            return Ok(SweepOutcome::Skipped);
        }

        let result = self.sweep().await;
        self.sweeping.store(false, Ordering::Release);
        result.map(SweepOutcome::Completed)
    }

    async fn sweep(&self) -> Result<SweepReport, StoreError> {
        // Snapshot with freshly recomputed expiry distances; no store lock
        // is held while notifications go out.
        let records = self.renewals.list()?;
        let mut report = SweepReport {
            scanned: records.len(),
            ..SweepReport::default()
        };

        for record in records {
            for threshold in due_thresholds(&record) {
                match self.dispatch(&record, threshold).await {
                    Ok(()) => match self.renewals.mark_alert_sent(&record.id, threshold) {
                        Ok(_) => report.dispatched += 1,
                        Err(err) => {
                            warn!(
                                renewal = %record.id.0,
                                days = threshold.days(),
                                %err,
                                "reminder sent but could not be recorded"
                            );
                            report.failed += 1;
                        }
                    },
                    Err(err) => {
                        warn!(
                            renewal = %record.id.0,
                            days = threshold.days(),
                            %err,
                            "reminder dispatch failed; will retry next sweep"
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        info!(
            scanned = report.scanned,
            dispatched = report.dispatched,
            failed = report.failed,
            "renewal alert sweep finished"
        );
        Ok(report)
    }

    /// One bounded dispatch. The sender runs on the blocking pool with its
    /// own timeout; expiry of that timeout is an ordinary dispatch failure.
    async fn dispatch(
        &self,
        record: &RenewalRecord,
        threshold: AlertThreshold,
    ) -> Result<(), DispatchError> {
        let notification = renewal_reminder(record, threshold);
        let sender = Arc::clone(&self.sender);
        let attempt = tokio::task::spawn_blocking(move || sender.send(notification));

        match tokio::time::timeout(self.dispatch_timeout, attempt).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(DispatchError::Transport(join_err.to_string())),
            Err(_) => Err(DispatchError::TimedOut),
        }
    }

    /// Spawn the hourly loop. The returned handle stops the timer on
    /// teardown while letting an in-flight sweep finish.
    pub fn start(self: Arc<Self>, interval: Duration) -> SchedulerHandle {
        let (shutdown, mut signal) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval fires immediately; consume
            // it so the first sweep happens one full interval after startup.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = self.run_sweep().await {
                            warn!(%err, "renewal alert sweep aborted");
                        }
                    }
                    _ = signal.changed() => {
                        info!("alert scheduler stopping");
                        break;
                    }
                }
            }
        });

        SchedulerHandle { shutdown, task }
    }
}

/// Owns the background sweep loop.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal shutdown and wait for the loop to exit. A sweep that is
    /// already running completes first, so alert marks are never left
    /// half-applied.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// Reminder message for one (renewal, checkpoint) pair.
fn renewal_reminder(record: &RenewalRecord, threshold: AlertThreshold) -> Notification {
    let days = record.days_until_expiry;
    Notification {
        channel: NotificationChannel::Email,
        recipient: record.user_name.clone(),
        subject: format!("Park guide license expires in {days} day(s)"),
        body: format!(
            "Hi {name}, your park guide license expires on {expiry}. \
             This is your {window}-day renewal reminder; the renewal fee is RM{fee:.2}.",
            name = record.user_name,
            expiry = record.expired_date.format("%Y-%m-%d"),
            window = threshold.days(),
            fee = f64::from(record.renewal_fee),
        ),
    }
}
