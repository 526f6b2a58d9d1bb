use serde::{Deserialize, Serialize};

use super::domain::{ApprovalId, ApprovalRecord, RenewalId, RenewalRecord};

/// Storage abstraction for approval records so the tracker can be exercised
/// against in-memory doubles.
pub trait ApprovalStore: Send + Sync {
    fn insert(&self, record: ApprovalRecord) -> Result<ApprovalRecord, StoreError>;
    fn list(&self) -> Result<Vec<ApprovalRecord>, StoreError>;
    fn fetch(&self, id: &ApprovalId) -> Result<Option<ApprovalRecord>, StoreError>;
    /// Read-modify-write applied under the store's record lock so a UI edit
    /// and a sweep racing on the same record cannot lose updates. Returns
    /// the updated copy.
    fn with_record(
        &self,
        id: &ApprovalId,
        apply: &mut dyn FnMut(&mut ApprovalRecord),
    ) -> Result<ApprovalRecord, StoreError>;
}

/// Storage abstraction for renewal records.
pub trait RenewalStore: Send + Sync {
    fn insert(&self, record: RenewalRecord) -> Result<RenewalRecord, StoreError>;
    fn list(&self) -> Result<Vec<RenewalRecord>, StoreError>;
    fn fetch(&self, id: &RenewalId) -> Result<Option<RenewalRecord>, StoreError>;
    /// See [`ApprovalStore::with_record`].
    fn with_record(
        &self,
        id: &RenewalId,
        apply: &mut dyn FnMut(&mut RenewalRecord),
    ) -> Result<RenewalRecord, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Outbound channels the platform can reach a guide on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Sms,
    Push,
}

/// Message handed to the injected transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub channel: NotificationChannel,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Transport capability implemented by the hosting service (or by test
/// doubles). The sweep calls this outside any record lock and with its own
/// timeout, so a slow transport never stalls UI commands.
pub trait NotificationSender: Send + Sync {
    fn send(&self, notification: Notification) -> Result<(), DispatchError>;
}

/// Recoverable dispatch failure; the affected threshold stays unmarked and
/// is retried on the next sweep.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("notification dispatch timed out")]
    TimedOut,
}
