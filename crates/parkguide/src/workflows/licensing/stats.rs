use serde::Serialize;

use super::domain::{ApprovalRecord, ApprovalStatus, RenewalRecord, RENEW_REQUIRED_STATUS};

/// Counts of approval records by review status; a strict partition, so the
/// buckets always sum to `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApprovalStatsSnapshot {
    pub total: usize,
    pub approved: usize,
    pub pending: usize,
    pub rejected: usize,
}

impl ApprovalStatsSnapshot {
    pub fn tally(records: &[ApprovalRecord]) -> Self {
        let mut snapshot = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.status {
                ApprovalStatus::Approved => snapshot.approved += 1,
                ApprovalStatus::Pending => snapshot.pending += 1,
                ApprovalStatus::Reject => snapshot.rejected += 1,
            }
        }
        snapshot
    }
}

/// Independent renewal tallies. Categories may overlap (a renewed record
/// keeps its historical expiry math), so this is not a partition.
///
/// Expects records whose `days_until_expiry` has already been refreshed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenewalStatsSnapshot {
    pub total: usize,
    pub expired: usize,
    pub expiring_soon: usize,
    pub renewed: usize,
    pub unpaid: usize,
    pub requires_renewal: usize,
}

impl RenewalStatsSnapshot {
    pub fn tally(records: &[RenewalRecord]) -> Self {
        let mut snapshot = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            if record.days_until_expiry < 0 {
                snapshot.expired += 1;
            }
            if record.days_until_expiry > 0 && record.days_until_expiry <= 30 {
                snapshot.expiring_soon += 1;
            }
            if record.is_renewed() {
                snapshot.renewed += 1;
            }
            if record.is_unpaid() {
                snapshot.unpaid += 1;
            }
            if record.status == RENEW_REQUIRED_STATUS {
                snapshot.requires_renewal += 1;
            }
        }
        snapshot
    }
}

/// Dashboard summary composing both tracker snapshots. Pure read side; no
/// mutation happens on this path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LicenseStats {
    pub approvals: ApprovalStatsSnapshot,
    pub renewals: RenewalStatsSnapshot,
}

impl LicenseStats {
    pub fn compose(approvals: ApprovalStatsSnapshot, renewals: RenewalStatsSnapshot) -> Self {
        Self {
            approvals,
            renewals,
        }
    }
}
