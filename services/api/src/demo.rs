use crate::infra::{InMemoryApprovalStore, InMemoryRenewalStore};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

use parkguide::error::AppError;
use parkguide::workflows::licensing::{
    ApprovalId, ApprovalRecord, ApprovalStatus, Clock, DispatchError, FixedClock, LicenseKind,
    LicensingService, Notification, NotificationSender, RenewalId, RenewalRecord, SweepOutcome,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date for the demo (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SweepArgs {
    /// Evaluation date for the sweep (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

/// Sender used by the CLI commands so dispatched reminders land on stdout.
#[derive(Default)]
struct ConsoleSender;

impl NotificationSender for ConsoleSender {
    fn send(&self, notification: Notification) -> Result<(), DispatchError> {
        println!(
            "  [{:?}] to {}: {}",
            notification.channel, notification.recipient, notification.subject
        );
        Ok(())
    }
}

type DemoService = LicensingService<InMemoryApprovalStore, InMemoryRenewalStore, ConsoleSender>;

pub(crate) async fn run_sweep(args: SweepArgs) -> Result<(), AppError> {
    let today = resolve_today(args.today);
    let service = seeded_service(today);

    println!("Reminder sweep (evaluated {})", today.date_naive());
    report_sweep(&service).await?;

    println!("\nRenewal roster after sweep");
    render_renewals(&service)?;
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = resolve_today(args.today);
    let service = seeded_service(today);

    println!("Park guide licensing demo (evaluated {})", today.date_naive());

    println!("\nPending applications");
    for record in service.list_approvals()? {
        println!(
            "- {}: {} | course {} | mentor {} | exam {} | status {}",
            record.id.0,
            record.user_name,
            record.course,
            record.mentor_programme,
            record.exam,
            record.status.label()
        );
    }

    println!("\nReviewing application A1");
    let reviewed = service.update_approval_status(
        &ApprovalId("A1".to_string()),
        "approved",
        Some("demo-reviewer".to_string()),
    )?;
    println!(
        "- {} is now {} (reviewed {})",
        reviewed.user_name,
        reviewed.status.label(),
        reviewed
            .review_date
            .map(|ts| ts.date_naive().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );

    println!("\nRenewal roster");
    render_renewals(&service)?;

    println!("\nReminder sweep");
    report_sweep(&service).await?;

    println!("\nRecording payment and issuing the renewed license for R1");
    service.update_payment_status(&RenewalId("R1".to_string()), "Paid")?;
    service.send_license(LicenseKind::Renewal, "R1")?;
    match service.renewals().fetch(&RenewalId("R1".to_string())) {
        Ok(Some(record)) => println!(
            "- {} -> status {} | license {}",
            record.user_name,
            record.status,
            record.license_number.as_deref().unwrap_or("pending")
        ),
        Ok(None) => println!("- renewal R1 missing after issuance"),
        Err(err) => println!("- renewal lookup unavailable: {err}"),
    }

    println!("\nBulk renewing the remaining selection");
    let outcome = service.bulk_renew(&[
        RenewalId("R2".to_string()),
        RenewalId("R3".to_string()),
        RenewalId("R4".to_string()),
    ])?;
    println!("- {}", outcome.message);

    let stats = service.license_stats()?;
    println!("\nDashboard stats");
    println!(
        "- approvals: {} total | {} pending | {} approved | {} rejected",
        stats.approvals.total,
        stats.approvals.pending,
        stats.approvals.approved,
        stats.approvals.rejected
    );
    println!(
        "- renewals: {} total | {} expired | {} expiring soon | {} renewed | {} unpaid",
        stats.renewals.total,
        stats.renewals.expired,
        stats.renewals.expiring_soon,
        stats.renewals.renewed,
        stats.renewals.unpaid
    );

    Ok(())
}

fn resolve_today(today: Option<NaiveDate>) -> DateTime<Utc> {
    match today {
        Some(date) => Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)),
        None => Utc
            .from_utc_datetime(&Local::now().date_naive().and_time(NaiveTime::MIN)),
    }
}

fn seeded_service(now: DateTime<Utc>) -> Arc<DemoService> {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(now));
    let service = Arc::new(LicensingService::new(
        Arc::new(InMemoryApprovalStore::default()),
        Arc::new(InMemoryRenewalStore::default()),
        Arc::new(ConsoleSender),
        clock,
        Duration::from_secs(5),
    ));

    for record in sample_approvals(now) {
        if let Err(err) = service.approvals().insert(record) {
            println!("  skipped seeding an application: {err}");
        }
    }
    for record in sample_renewals(now) {
        if let Err(err) = service.renewals().insert(record) {
            println!("  skipped seeding a renewal: {err}");
        }
    }
    service
}

fn sample_approvals(now: DateTime<Utc>) -> Vec<ApprovalRecord> {
    vec![
        approval("A1", "Siti Aminah", now),
        approval("A2", "Lim Wei", now),
    ]
}

fn sample_renewals(now: DateTime<Utc>) -> Vec<RenewalRecord> {
    let mut unpaid = renewal("R4", "Ravi Kumar", 10, now);
    unpaid.payment = "Not Started".to_string();
    vec![
        renewal("R1", "Jon Tan", 25, now),
        renewal("R2", "Mei Ling", 3, now),
        renewal("R3", "Aina Rahman", -2, now),
        unpaid,
    ]
}

fn approval(id: &str, user_name: &str, now: DateTime<Utc>) -> ApprovalRecord {
    ApprovalRecord {
        id: ApprovalId(id.to_string()),
        user_name: user_name.to_string(),
        course: "Completed".to_string(),
        mentor_programme: "Completed".to_string(),
        exam: "Pass".to_string(),
        status: ApprovalStatus::Pending,
        date_submitted: now - chrono::Duration::days(7),
        reviewed_by: None,
        review_date: None,
    }
}

fn renewal(id: &str, user_name: &str, expires_in_days: i64, now: DateTime<Utc>) -> RenewalRecord {
    RenewalRecord {
        id: RenewalId(id.to_string()),
        user_name: user_name.to_string(),
        start_date: now.date_naive() - chrono::Duration::days(365),
        expired_date: now.date_naive() + chrono::Duration::days(expires_in_days),
        payment: "Paid".to_string(),
        status: "Active".to_string(),
        days_until_expiry: 0,
        renewal_fee: 150,
        email_alerts_sent: Default::default(),
        license_number: None,
    }
}

async fn report_sweep(service: &DemoService) -> Result<(), AppError> {
    match service.run_sweep().await? {
        SweepOutcome::Completed(report) => println!(
            "- scanned {} | dispatched {} | failed {}",
            report.scanned, report.dispatched, report.failed
        ),
        SweepOutcome::Skipped => println!("- sweep skipped: another sweep is in flight"),
    }
    Ok(())
}

fn render_renewals(service: &DemoService) -> Result<(), AppError> {
    for record in service.list_renewals()? {
        let view = record.view();
        println!(
            "- {}: {} | expires {} ({} day(s)) | payment {} | priority {} | alerts sent {:?}",
            view.id.0,
            view.user_name,
            view.expired_date,
            view.days_until_expiry,
            view.payment,
            view.priority,
            view.email_alerts_sent
        );
    }
    Ok(())
}
