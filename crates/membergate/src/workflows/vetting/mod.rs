//! Applicant vetting workflow: status transition engine, event access gate,
//! and the self-service status projections built on top of the shared
//! application store.

pub mod access;
pub mod cache;
pub mod domain;
pub mod public;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use access::{
    AccessControlGate, AccessDecision, AccessError, AccessGateConfig, DenialReason,
};
pub use cache::{NoStatusCache, StatusCache, TtlStatusCache, VettingLookup};
pub use domain::{
    ApplicationId, AuditAction, AuditLogEntry, EventId, StatusToken, UnknownStatus, UserId,
    VettingApplication, VettingStatus,
};
pub use public::{LookupError, StatusLookup, StatusView};
pub use repository::{
    ApplicationStore, DirectoryError, NotifyError, RoleDirectory, StatusNotifier, StoreError,
};
pub use router::{vetting_router, ApplicationView, VettingRouterState};
pub use service::{VettingError, VettingWorkflowService};
