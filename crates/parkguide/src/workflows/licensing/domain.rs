use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for license applications under review.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApprovalId(pub String);

/// Identifier wrapper for issued licenses tracked for renewal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RenewalId(pub String);

/// Review state of a license application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Reject,
}

impl ApprovalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Reject => "reject",
        }
    }

    /// Parse a status token from the UI, rejecting anything outside the
    /// known vocabulary before any mutation happens.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "reject" => Ok(ApprovalStatus::Reject),
            _ => Err(ValidationError::UnknownApprovalStatus(value.to_string())),
        }
    }
}

/// Days-before-expiry checkpoints at which a reminder fires once per renewal.
///
/// Variant order gives ascending day counts so ordered collections iterate
/// soonest checkpoint first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertThreshold {
    FiveDays,
    FifteenDays,
    ThirtyDays,
}

impl AlertThreshold {
    pub const fn days(self) -> i64 {
        match self {
            AlertThreshold::FiveDays => 5,
            AlertThreshold::FifteenDays => 15,
            AlertThreshold::ThirtyDays => 30,
        }
    }

    pub fn from_days(days: i64) -> Option<Self> {
        match days {
            5 => Some(AlertThreshold::FiveDays),
            15 => Some(AlertThreshold::FifteenDays),
            30 => Some(AlertThreshold::ThirtyDays),
            _ => None,
        }
    }
}

/// Fixed reminder schedule, furthest checkpoint first.
pub const ALERT_THRESHOLDS: [AlertThreshold; 3] = [
    AlertThreshold::ThirtyDays,
    AlertThreshold::FifteenDays,
    AlertThreshold::FiveDays,
];

/// Renewal status assigned once a license has been renewed; terminal.
pub const RENEWED_STATUS: &str = "Renewed";

/// Renewal status flagging records the admin queue should chase.
pub const RENEW_REQUIRED_STATUS: &str = "Renew Required";

/// Payment tokens treated as "no payment received".
pub const UNPAID_PAYMENT_STATES: [&str; 2] = ["None", "Not Started"];

/// Tracks one guide's license application through review.
///
/// `review_date` is refreshed exactly when `status` changes through a
/// tracker command; records are created when a guide completes the
/// prerequisites and are never deleted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub id: ApprovalId,
    pub user_name: String,
    pub course: String,
    pub mentor_programme: String,
    pub exam: String,
    pub status: ApprovalStatus,
    pub date_submitted: DateTime<Utc>,
    pub reviewed_by: Option<String>,
    pub review_date: Option<DateTime<Utc>>,
}

impl ApprovalRecord {
    /// Course and mentor programme completed and the exam passed.
    pub fn prerequisites_met(&self) -> bool {
        self.course.eq_ignore_ascii_case("completed")
            && self.mentor_programme.eq_ignore_ascii_case("completed")
            && self.exam.eq_ignore_ascii_case("pass")
    }
}

/// Tracks one issued license's expiry, payment, and renewal state.
///
/// `days_until_expiry` is a cached snapshot of the canonical expiry math;
/// decision paths recompute it from `expired_date` first.
/// `email_alerts_sent` only ever grows and is kept inside `{30, 15, 5}` by
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenewalRecord {
    pub id: RenewalId,
    pub user_name: String,
    pub start_date: NaiveDate,
    pub expired_date: NaiveDate,
    pub payment: String,
    pub status: String,
    pub days_until_expiry: i64,
    pub renewal_fee: u32,
    pub email_alerts_sent: BTreeSet<AlertThreshold>,
    pub license_number: Option<String>,
}

impl RenewalRecord {
    pub fn is_renewed(&self) -> bool {
        self.status == RENEWED_STATUS
    }

    pub fn is_expired(&self) -> bool {
        self.days_until_expiry < 0
    }

    pub fn is_unpaid(&self) -> bool {
        UNPAID_PAYMENT_STATES
            .iter()
            .any(|state| self.payment == *state)
    }

    /// Renewals past expiry or without payment cannot be renewed in bulk.
    pub fn is_eligible_for_renewal(&self) -> bool {
        !self.is_expired() && !self.is_unpaid()
    }

    pub fn priority(&self) -> RenewalPriority {
        if self.days_until_expiry < 0 || self.days_until_expiry <= 5 {
            RenewalPriority::High
        } else if self.days_until_expiry <= 15 {
            RenewalPriority::Medium
        } else {
            RenewalPriority::Low
        }
    }

    /// Wire representation for API responses; reminder checkpoints are
    /// exposed as plain day counts.
    pub fn view(&self) -> RenewalView {
        RenewalView {
            id: self.id.clone(),
            user_name: self.user_name.clone(),
            start_date: self.start_date,
            expired_date: self.expired_date,
            payment: self.payment.clone(),
            status: self.status.clone(),
            days_until_expiry: self.days_until_expiry,
            renewal_fee: self.renewal_fee,
            email_alerts_sent: self.email_alerts_sent.iter().map(|t| t.days()).collect(),
            license_number: self.license_number.clone(),
            priority: self.priority().label(),
        }
    }
}

/// Urgency bucket used to order renewal queues in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenewalPriority {
    High,
    Medium,
    Low,
}

impl RenewalPriority {
    pub const fn label(self) -> &'static str {
        match self {
            RenewalPriority::High => "high",
            RenewalPriority::Medium => "medium",
            RenewalPriority::Low => "low",
        }
    }
}

/// Sanitized renewal representation exposed over the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenewalView {
    pub id: RenewalId,
    pub user_name: String,
    pub start_date: NaiveDate,
    pub expired_date: NaiveDate,
    pub payment: String,
    pub status: String,
    pub days_until_expiry: i64,
    pub renewal_fee: u32,
    pub email_alerts_sent: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    pub priority: &'static str,
}

/// Which half of the lifecycle a license command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseKind {
    Approval,
    Renewal,
}

impl LicenseKind {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approval" => Ok(LicenseKind::Approval),
            "renewal" => Ok(LicenseKind::Renewal),
            _ => Err(ValidationError::UnknownLicenseKind(value.to_string())),
        }
    }
}

/// Input rejected before any mutation takes place.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown approval status '{0}'")]
    UnknownApprovalStatus(String),
    #[error("unknown license kind '{0}' (expected 'approval' or 'renewal')")]
    UnknownLicenseKind(String),
    #[error("'{0}' is not a valid calendar date (expected YYYY-MM-DD)")]
    MalformedDate(String),
}

/// License number assigned on issuance: `PG-YYYYMM-INITIALS-NNN`, where
/// `INITIALS` are the uppercase first letters of each word in the guide's
/// name and `NNN` is a zero-padded random serial.
pub fn generate_license_number(user_name: &str, now: DateTime<Utc>) -> String {
    let initials: String = user_name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(|c| c.to_uppercase())
        .filter(|c| c.is_ascii_alphabetic())
        .collect();
    let initials = if initials.is_empty() {
        "PG".to_string()
    } else {
        initials
    };
    let serial: u32 = rand::thread_rng().gen_range(0..1000);

    format!("PG-{}-{}-{:03}", now.format("%Y%m"), initials, serial)
}
