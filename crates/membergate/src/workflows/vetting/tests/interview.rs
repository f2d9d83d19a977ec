use chrono::{Duration, Utc};

use super::common::*;
use crate::workflows::vetting::domain::{ApplicationId, AuditAction, VettingStatus};
use crate::workflows::vetting::service::VettingError;

#[test]
fn schedule_interview_sets_fields_and_audits() {
    let harness = harness();
    harness
        .store
        .seed(application(VettingStatus::InterviewApproved));
    let id = ApplicationId("app-1".to_string());
    let when = Utc::now() + Duration::days(7);

    let updated = harness
        .service
        .schedule_interview(&id, when, "Community Center, Room 101", &admin())
        .expect("scheduling succeeds");

    assert_eq!(updated.status, VettingStatus::InterviewApproved);
    assert_eq!(updated.interview_scheduled_for, Some(when));
    assert_eq!(
        updated.interview_location.as_deref(),
        Some("Community Center, Room 101"),
    );
    assert!(updated.admin_notes.contains("Community Center, Room 101"));

    let entries = harness.store.audit_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::InterviewScheduled);
    assert_eq!(entries[0].new_value.as_deref(), Some(when.to_rfc3339().as_str()));
    assert!(entries[0].notes.contains("Community Center, Room 101"));

    let interviews = harness.notifier.interviews();
    assert_eq!(interviews.len(), 1);
    assert_eq!(interviews[0].1, when);
}

#[test]
fn past_interview_date_is_rejected() {
    let harness = harness();
    harness
        .store
        .seed(application(VettingStatus::InterviewApproved));

    match harness.service.schedule_interview(
        &ApplicationId("app-1".to_string()),
        Utc::now() - Duration::days(1),
        "Community Center",
        &admin(),
    ) {
        Err(VettingError::InvalidInterviewDate) => {}
        other => panic!("expected invalid interview date, got {other:?}"),
    }
    assert!(harness.store.audit_entries().is_empty());
}

#[test]
fn blank_interview_location_is_rejected() {
    let harness = harness();
    harness
        .store
        .seed(application(VettingStatus::InterviewApproved));

    match harness.service.schedule_interview(
        &ApplicationId("app-1".to_string()),
        Utc::now() + Duration::days(3),
        "   ",
        &admin(),
    ) {
        Err(VettingError::InterviewLocationRequired) => {}
        other => panic!("expected location required, got {other:?}"),
    }
    assert!(harness.store.audit_entries().is_empty());
}

#[test]
fn terminal_applications_cannot_schedule_interviews() {
    let harness = harness();
    harness.store.seed(application(VettingStatus::Denied));

    match harness.service.schedule_interview(
        &ApplicationId("app-1".to_string()),
        Utc::now() + Duration::days(3),
        "Community Center",
        &admin(),
    ) {
        Err(VettingError::TerminalStateModification(VettingStatus::Denied)) => {}
        other => panic!("expected terminal rejection, got {other:?}"),
    }
}
