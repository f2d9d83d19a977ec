use chrono::{DateTime, Utc};

use super::domain::{
    ApplicationId, AuditLogEntry, StatusToken, UserId, VettingApplication, VettingStatus,
};

/// Storage abstraction for application records and their audit trail, so the
/// engine can be exercised in isolation.
///
/// `save_with_audit` is the atomic unit behind every transition: the record
/// update and the audit append land together or not at all. Implementations
/// are also responsible for serializing concurrent writers against the same
/// application and rejecting the loser with [`StoreError::Conflict`].
pub trait ApplicationStore: Send + Sync {
    fn find_by_id(&self, id: &ApplicationId) -> Result<Option<VettingApplication>, StoreError>;
    fn find_by_user(&self, user: &UserId) -> Result<Option<VettingApplication>, StoreError>;
    fn find_by_token(&self, token: &StatusToken)
        -> Result<Option<VettingApplication>, StoreError>;
    fn save_with_audit(
        &self,
        application: &VettingApplication,
        entry: AuditLogEntry,
    ) -> Result<(), StoreError>;
    fn append_audit(&self, entry: AuditLogEntry) -> Result<(), StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("concurrent update rejected")]
    Conflict,
    #[error("corrupt application record: {0}")]
    Corrupted(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Identity directory exposing the role operations the engine needs.
pub trait RoleDirectory: Send + Sync {
    fn is_administrator(&self, user: &UserId) -> Result<bool, DirectoryError>;
    fn elevate_to_vetted_member(&self, user: &UserId) -> Result<(), DirectoryError>;
}

/// Error enumeration for directory failures.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("unknown user {0:?}")]
    UnknownUser(String),
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Outbound applicant notification hook. Delivery is advisory: the engine
/// records the outcome but never lets a failure reach its caller.
///
/// `Ok(false)` means the sender deliberately skipped delivery (e.g. no
/// template for the status), which is not a failure.
pub trait StatusNotifier: Send + Sync {
    fn send_status_update(
        &self,
        application: &VettingApplication,
        recipient_email: &str,
        recipient_name: &str,
        new_status: VettingStatus,
    ) -> Result<bool, NotifyError>;

    fn send_interview_scheduled(
        &self,
        application: &VettingApplication,
        recipient_email: &str,
        recipient_name: &str,
        scheduled_for: DateTime<Utc>,
        location: &str,
    ) -> Result<bool, NotifyError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
