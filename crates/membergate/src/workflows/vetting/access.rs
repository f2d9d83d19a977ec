use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use super::cache::{StatusCache, VettingLookup};
use super::domain::{AuditAction, AuditLogEntry, EventId, UserId, VettingStatus};
use super::repository::{ApplicationStore, StoreError};

/// Gate settings surfaced to applicants in denial messaging.
#[derive(Debug, Clone)]
pub struct AccessGateConfig {
    /// Contact address shown to applicants whose application is on hold.
    pub support_contact: String,
}

/// Action an access check guards. The rule set is shared; only the audit
/// label and the applicant-facing wording differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessAction {
    Rsvp,
    TicketPurchase,
}

impl AccessAction {
    const fn audit_action(self) -> AuditAction {
        match self {
            AccessAction::Rsvp => AuditAction::Rsvp,
            AccessAction::TicketPurchase => AuditAction::TicketPurchase,
        }
    }

    const fn blocked_phrase(self) -> &'static str {
        match self {
            AccessAction::Rsvp => "RSVP for events",
            AccessAction::TicketPurchase => "purchase tickets",
        }
    }
}

/// Machine-readable denial cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    ApplicationOnHold,
    ApplicationDenied,
    ApplicationWithdrawn,
}

/// Allow/deny answer returned to RSVP and ticket-purchase callers. The
/// resolved status rides along for caller-side display even when allowed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial_reason: Option<DenialReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vetting_status: Option<VettingStatus>,
}

impl AccessDecision {
    fn allowed(status: Option<VettingStatus>) -> Self {
        Self {
            allowed: true,
            denial_reason: None,
            user_message: None,
            vetting_status: status,
        }
    }

    fn denied(reason: DenialReason, message: String, status: VettingStatus) -> Self {
        Self {
            allowed: false,
            denial_reason: Some(reason),
            user_message: Some(message),
            vetting_status: Some(status),
        }
    }
}

/// Error raised by an access check when the user's status cannot be resolved.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Answers "can this user act right now?" purely from vetting status.
///
/// Users without an application on file are allowed: the gate only restricts
/// users whose application sits in a blocking state. Denials are audited;
/// allowed outcomes are not, keeping the trail focused on exceptions.
pub struct AccessControlGate<S, C> {
    store: Arc<S>,
    cache: Arc<C>,
    config: AccessGateConfig,
}

impl<S, C> AccessControlGate<S, C>
where
    S: ApplicationStore + 'static,
    C: StatusCache + 'static,
{
    pub fn new(store: Arc<S>, cache: Arc<C>, config: AccessGateConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    pub fn can_user_rsvp(
        &self,
        user: &UserId,
        event: &EventId,
    ) -> Result<AccessDecision, AccessError> {
        self.check(user, event, AccessAction::Rsvp)
    }

    pub fn can_user_purchase_ticket(
        &self,
        user: &UserId,
        event: &EventId,
    ) -> Result<AccessDecision, AccessError> {
        self.check(user, event, AccessAction::TicketPurchase)
    }

    fn check(
        &self,
        user: &UserId,
        event: &EventId,
        action: AccessAction,
    ) -> Result<AccessDecision, AccessError> {
        let lookup = match self.cache.get(user) {
            Some(cached) => {
                debug!(user = %user.0, "access check served from cache");
                cached
            }
            None => {
                let lookup = match self.store.find_by_user(user)? {
                    Some(application) => VettingLookup::OnFile {
                        application_id: application.id,
                        status: application.status,
                    },
                    None => VettingLookup::NoApplication,
                };
                self.cache.set(user, lookup.clone());
                lookup
            }
        };

        let decision = self.evaluate(&lookup, action);

        if !decision.allowed {
            if let VettingLookup::OnFile { application_id, status } = &lookup {
                self.log_denial(application_id.clone(), user, event, action, *status, &decision);
            }
        }

        Ok(decision)
    }

    fn evaluate(&self, lookup: &VettingLookup, action: AccessAction) -> AccessDecision {
        let status = match lookup {
            VettingLookup::NoApplication => return AccessDecision::allowed(None),
            VettingLookup::OnFile { status, .. } => *status,
        };

        match status {
            VettingStatus::OnHold => AccessDecision::denied(
                DenialReason::ApplicationOnHold,
                format!(
                    "Your membership application is on hold. Please contact {} to provide \
                     additional information and reactivate your application.",
                    self.config.support_contact
                ),
                status,
            ),
            VettingStatus::Denied => AccessDecision::denied(
                DenialReason::ApplicationDenied,
                format!(
                    "Your membership application was denied. You cannot {} at this time.",
                    action.blocked_phrase()
                ),
                status,
            ),
            VettingStatus::Withdrawn => AccessDecision::denied(
                DenialReason::ApplicationWithdrawn,
                format!(
                    "You withdrew your membership application. You may submit a new application \
                     to {} again.",
                    action.blocked_phrase()
                ),
                status,
            ),
            _ => AccessDecision::allowed(Some(status)),
        }
    }

    /// Audit the denial. A failed audit write is logged but never blocks the
    /// decision itself.
    fn log_denial(
        &self,
        application_id: super::domain::ApplicationId,
        user: &UserId,
        event: &EventId,
        action: AccessAction,
        status: VettingStatus,
        decision: &AccessDecision,
    ) {
        let reason = decision
            .user_message
            .as_deref()
            .unwrap_or("access blocked by vetting status");
        let entry = AuditLogEntry {
            application_id,
            action: action.audit_action(),
            old_value: None,
            new_value: None,
            actor: user.clone(),
            recorded_at: Utc::now(),
            notes: format!(
                "Access denied for event {}. Vetting status: {status}. Reason: {reason}",
                event.0
            ),
        };

        if let Err(err) = self.store.append_audit(entry) {
            warn!(
                user = %user.0,
                event = %event.0,
                error = %err, "failed to audit access denial"
            );
        }
    }
}
