use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::cache::StatusCache;
use super::domain::{
    ApplicationId, AuditAction, AuditLogEntry, UserId, VettingApplication, VettingStatus,
};
use super::repository::{
    ApplicationStore, DirectoryError, RoleDirectory, StatusNotifier, StoreError,
};

/// The status transition engine. Validates and applies state changes,
/// enforces the edge table, writes audit entries, and triggers role elevation
/// and applicant notification as side effects.
pub struct VettingWorkflowService<S, D, N, C> {
    store: Arc<S>,
    directory: Arc<D>,
    notifier: Arc<N>,
    cache: Arc<C>,
}

impl<S, D, N, C> VettingWorkflowService<S, D, N, C>
where
    S: ApplicationStore + 'static,
    D: RoleDirectory + 'static,
    N: StatusNotifier + 'static,
    C: StatusCache + 'static,
{
    pub fn new(store: Arc<S>, directory: Arc<D>, notifier: Arc<N>, cache: Arc<C>) -> Self {
        Self {
            store,
            directory,
            notifier,
            cache,
        }
    }

    /// Request a status transition on behalf of an administrative actor.
    ///
    /// Validation happens before any write; a rejected request leaves the
    /// record and the audit trail untouched. On success the record update and
    /// one audit entry are persisted atomically, the linked user's cache entry
    /// is invalidated, and a best-effort notification is dispatched.
    pub fn request_transition(
        &self,
        application_id: &ApplicationId,
        target: VettingStatus,
        notes: Option<&str>,
        actor: &UserId,
    ) -> Result<VettingApplication, VettingError> {
        let mut application = self
            .store
            .find_by_id(application_id)?
            .ok_or(VettingError::NotFound)?;

        self.require_administrator(actor)?;

        let current = application.status;
        if current.is_terminal() {
            return Err(VettingError::TerminalStateModification(current));
        }
        if !current.permits_transition_to(target) {
            return Err(VettingError::InvalidTransition {
                from: current,
                to: target,
            });
        }

        let notes = notes.map(str::trim).filter(|value| !value.is_empty());
        if current.transition_requires_notes(target) && notes.is_none() {
            return Err(VettingError::NotesRequired(target));
        }

        let now = Utc::now();

        // The privilege grant is part of the approval: attempt it before any
        // write so a failed grant leaves the record at its current status.
        if target == VettingStatus::Approved {
            if let Some(user) = &application.user_id {
                self.directory.elevate_to_vetted_member(user)?;
            }
        }

        application.status = target;
        let fragment = match notes {
            Some(text) => format!("Status change to {target}: {text}"),
            None => format!("Status change to {target}"),
        };
        application.append_admin_note(now, &fragment);
        if target.is_terminal() && application.decision_made_at.is_none() {
            application.decision_made_at = Some(now);
        }
        application.updated_at = now;

        let entry = AuditLogEntry {
            application_id: application.id.clone(),
            action: AuditAction::StatusChanged,
            old_value: Some(current.label().to_string()),
            new_value: Some(target.label().to_string()),
            actor: actor.clone(),
            recorded_at: now,
            notes: notes.unwrap_or_default().to_string(),
        };
        self.store.save_with_audit(&application, entry)?;

        if let Some(user) = &application.user_id {
            self.cache.invalidate(user);
        }

        self.notify_status_change(&application, target);

        Ok(application)
    }

    /// Record an interview slot on the application. Leaves `status` untouched;
    /// the reviewer drives any accompanying stage change separately.
    pub fn schedule_interview(
        &self,
        application_id: &ApplicationId,
        scheduled_for: DateTime<Utc>,
        location: &str,
        actor: &UserId,
    ) -> Result<VettingApplication, VettingError> {
        let mut application = self
            .store
            .find_by_id(application_id)?
            .ok_or(VettingError::NotFound)?;

        self.require_administrator(actor)?;

        if application.status.is_terminal() {
            return Err(VettingError::TerminalStateModification(application.status));
        }
        if scheduled_for <= Utc::now() {
            return Err(VettingError::InvalidInterviewDate);
        }
        let location = location.trim();
        if location.is_empty() {
            return Err(VettingError::InterviewLocationRequired);
        }

        let now = Utc::now();
        let previous = application
            .interview_scheduled_for
            .map(|when| when.to_rfc3339());

        application.interview_scheduled_for = Some(scheduled_for);
        application.interview_location = Some(location.to_string());
        application.append_admin_note(
            now,
            &format!(
                "Interview scheduled for {} at {location}",
                scheduled_for.format("%Y-%m-%d %H:%M UTC")
            ),
        );
        application.updated_at = now;

        let entry = AuditLogEntry {
            application_id: application.id.clone(),
            action: AuditAction::InterviewScheduled,
            old_value: previous,
            new_value: Some(scheduled_for.to_rfc3339()),
            actor: actor.clone(),
            recorded_at: now,
            notes: format!("Location: {location}"),
        };
        self.store.save_with_audit(&application, entry)?;

        if let Some(user) = &application.user_id {
            self.cache.invalidate(user);
        }

        match self.notifier.send_interview_scheduled(
            &application,
            &application.email,
            &application.display_name,
            scheduled_for,
            location,
        ) {
            Ok(sent) => debug!(
                application = %application.application_number,
                sent, "interview notification dispatched"
            ),
            Err(err) => warn!(
                application = %application.application_number,
                error = %err, "interview notification failed"
            ),
        }

        Ok(application)
    }

    /// Approve an application in final review, elevating the linked user to
    /// vetted member.
    pub fn approve(
        &self,
        application_id: &ApplicationId,
        actor: &UserId,
        notes: &str,
    ) -> Result<VettingApplication, VettingError> {
        if notes.trim().is_empty() {
            return Err(VettingError::NotesRequired(VettingStatus::Approved));
        }
        self.request_transition(application_id, VettingStatus::Approved, Some(notes), actor)
    }

    /// Deny an application in final review with a recorded reason.
    pub fn deny(
        &self,
        application_id: &ApplicationId,
        reason: &str,
        actor: &UserId,
    ) -> Result<VettingApplication, VettingError> {
        if reason.trim().is_empty() {
            return Err(VettingError::NotesRequired(VettingStatus::Denied));
        }
        self.request_transition(application_id, VettingStatus::Denied, Some(reason), actor)
    }

    /// Put an application on hold, recording the reason and the actions the
    /// applicant must take to resume review.
    pub fn put_on_hold(
        &self,
        application_id: &ApplicationId,
        reason: &str,
        required_actions: &str,
        actor: &UserId,
    ) -> Result<VettingApplication, VettingError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(VettingError::NotesRequired(VettingStatus::OnHold));
        }
        let required_actions = required_actions.trim();
        let notes = if required_actions.is_empty() {
            reason.to_string()
        } else {
            format!("{reason}\nRequired actions: {required_actions}")
        };
        self.request_transition(application_id, VettingStatus::OnHold, Some(&notes), actor)
    }

    fn require_administrator(&self, actor: &UserId) -> Result<(), VettingError> {
        if self.directory.is_administrator(actor)? {
            Ok(())
        } else {
            Err(VettingError::AccessDenied)
        }
    }

    /// Advisory applicant notification. Statuses without an applicant-facing
    /// message are skipped; delivery failure is logged and swallowed.
    fn notify_status_change(&self, application: &VettingApplication, new_status: VettingStatus) {
        if !new_status.notifies_applicant() {
            return;
        }

        match self.notifier.send_status_update(
            application,
            &application.email,
            &application.display_name,
            new_status,
        ) {
            Ok(sent) => debug!(
                application = %application.application_number,
                status = %new_status,
                sent, "status notification dispatched"
            ),
            Err(err) => warn!(
                application = %application.application_number,
                status = %new_status,
                error = %err, "status notification failed"
            ),
        }
    }
}

/// Error raised by the transition engine.
#[derive(Debug, thiserror::Error)]
pub enum VettingError {
    #[error("application not found")]
    NotFound,
    #[error("access denied: only administrators can review applications")]
    AccessDenied,
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: VettingStatus,
        to: VettingStatus,
    },
    #[error("cannot modify terminal state {0}")]
    TerminalStateModification(VettingStatus),
    #[error("admin notes required for transition to {0}")]
    NotesRequired(VettingStatus),
    #[error("interview date must be in the future")]
    InvalidInterviewDate,
    #[error("interview location required")]
    InterviewLocationRequired,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}
