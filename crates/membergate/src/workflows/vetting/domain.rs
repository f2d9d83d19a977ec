use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for vetting applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for platform user accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for events referenced by access checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

/// Opaque token handed to applicants for unauthenticated status lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusToken(pub String);

/// Review stage of a vetting application. The engine treats this as a closed
/// set: persisted text outside the known labels is data corruption, not a new
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VettingStatus {
    UnderReview,
    InterviewApproved,
    FinalReview,
    OnHold,
    Approved,
    Denied,
    Withdrawn,
}

impl VettingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VettingStatus::UnderReview => "under_review",
            VettingStatus::InterviewApproved => "interview_approved",
            VettingStatus::FinalReview => "final_review",
            VettingStatus::OnHold => "on_hold",
            VettingStatus::Approved => "approved",
            VettingStatus::Denied => "denied",
            VettingStatus::Withdrawn => "withdrawn",
        }
    }

    /// Terminal statuses are immutable to the transition engine.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            VettingStatus::Approved | VettingStatus::Denied | VettingStatus::Withdrawn
        )
    }

    /// The reviewed edge table. `Withdrawn` is applicant-initiated and has no
    /// administrative edge into it.
    pub const fn permits_transition_to(self, target: VettingStatus) -> bool {
        matches!(
            (self, target),
            (VettingStatus::UnderReview, VettingStatus::InterviewApproved)
                | (VettingStatus::UnderReview, VettingStatus::OnHold)
                | (VettingStatus::OnHold, VettingStatus::UnderReview)
                | (VettingStatus::InterviewApproved, VettingStatus::FinalReview)
                | (VettingStatus::FinalReview, VettingStatus::Approved)
                | (VettingStatus::FinalReview, VettingStatus::Denied)
        )
    }

    /// Edges that must carry a reviewer justification.
    pub const fn transition_requires_notes(self, target: VettingStatus) -> bool {
        matches!(
            (self, target),
            (VettingStatus::UnderReview, VettingStatus::OnHold)
                | (VettingStatus::OnHold, VettingStatus::UnderReview)
                | (VettingStatus::FinalReview, VettingStatus::Approved)
                | (VettingStatus::FinalReview, VettingStatus::Denied)
        )
    }

    /// Statuses that trigger an applicant-facing notification when entered.
    pub const fn notifies_applicant(self) -> bool {
        matches!(
            self,
            VettingStatus::InterviewApproved
                | VettingStatus::OnHold
                | VettingStatus::Approved
                | VettingStatus::Denied
        )
    }

    /// Applicant-facing description used by the self-service status pages.
    pub const fn description(self) -> &'static str {
        match self {
            VettingStatus::UnderReview => {
                "Your application is currently under review by our membership team."
            }
            VettingStatus::InterviewApproved => {
                "You have been approved for an interview. Watch your email for scheduling details."
            }
            VettingStatus::FinalReview => {
                "Your interview is complete and your application is in final review."
            }
            VettingStatus::OnHold => {
                "Your application is on hold. Check your email for the steps needed to continue."
            }
            VettingStatus::Approved => "Congratulations! Your application has been approved.",
            VettingStatus::Denied => "Your application was not approved at this time.",
            VettingStatus::Withdrawn => {
                "You withdrew your application. You are welcome to apply again in the future."
            }
        }
    }

    /// Coarse progress indicator for the self-service status pages, derived
    /// purely from the status.
    pub const fn progress_percent(self) -> u8 {
        match self {
            VettingStatus::UnderReview | VettingStatus::OnHold => 25,
            VettingStatus::InterviewApproved => 50,
            VettingStatus::FinalReview => 75,
            VettingStatus::Approved | VettingStatus::Denied | VettingStatus::Withdrawn => 100,
        }
    }
}

impl fmt::Display for VettingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raised when persisted status text does not name a known review stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown vetting status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for VettingStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "under_review" => Ok(VettingStatus::UnderReview),
            "interview_approved" => Ok(VettingStatus::InterviewApproved),
            "final_review" => Ok(VettingStatus::FinalReview),
            "on_hold" => Ok(VettingStatus::OnHold),
            "approved" => Ok(VettingStatus::Approved),
            "denied" => Ok(VettingStatus::Denied),
            "withdrawn" => Ok(VettingStatus::Withdrawn),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One applicant's review record, created by the intake flow and mutated only
/// through the transition engine until a terminal status is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VettingApplication {
    pub id: ApplicationId,
    pub application_number: String,
    pub status_token: StatusToken,
    pub user_id: Option<UserId>,
    pub display_name: String,
    pub email: String,
    pub status: VettingStatus,
    pub admin_notes: String,
    pub decision_made_at: Option<DateTime<Utc>>,
    pub interview_scheduled_for: Option<DateTime<Utc>>,
    pub interview_location: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VettingApplication {
    /// Append a timestamped fragment to the reviewer notes. Existing notes are
    /// never overwritten.
    pub fn append_admin_note(&mut self, recorded_at: DateTime<Utc>, fragment: &str) {
        let stamped = format!("[{}] {}", recorded_at.format("%Y-%m-%dT%H:%M:%SZ"), fragment);
        if self.admin_notes.is_empty() {
            self.admin_notes = stamped;
        } else {
            self.admin_notes.push('\n');
            self.admin_notes.push_str(&stamped);
        }
    }
}

/// Kind discriminator for audit trail entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    StatusChanged,
    InterviewScheduled,
    Rsvp,
    TicketPurchase,
}

impl AuditAction {
    pub const fn label(self) -> &'static str {
        match self {
            AuditAction::StatusChanged => "Status Changed",
            AuditAction::InterviewScheduled => "Interview Scheduled",
            AuditAction::Rsvp => "RSVP",
            AuditAction::TicketPurchase => "TicketPurchase",
        }
    }
}

/// Immutable record of one state-changing or access-denying action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub application_id: ApplicationId,
    pub action: AuditAction,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub actor: UserId,
    pub recorded_at: DateTime<Utc>,
    pub notes: String,
}
