use crate::infra::{InMemoryRoleDirectory, InMemoryVettingStore, LoggingStatusNotifier};
use chrono::{Duration, Utc};
use clap::Args;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use membergate::error::AppError;
use membergate::workflows::vetting::{
    AccessControlGate, AccessGateConfig, ApplicationId, EventId, StatusLookup, StatusToken,
    TtlStatusCache, UserId, VettingApplication, VettingStatus, VettingWorkflowService,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the audit trail accumulated during the demo
    #[arg(long)]
    pub(crate) show_audit: bool,
}

fn sample_application(id: &str, token: &str, user: Option<&str>) -> VettingApplication {
    let now = Utc::now();
    VettingApplication {
        id: ApplicationId(id.to_string()),
        application_number: format!("VET-{}-{}", now.format("%Y%m%d"), &id[4..]),
        status_token: StatusToken(token.to_string()),
        user_id: user.map(|value| UserId(value.to_string())),
        display_name: "Alex Doe".to_string(),
        email: "alex@example.com".to_string(),
        status: VettingStatus::UnderReview,
        admin_notes: String::new(),
        decision_made_at: None,
        interview_scheduled_for: None,
        interview_location: None,
        submitted_at: now,
        updated_at: now,
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let admin = UserId("admin-1".to_string());
    let applicant = UserId("user-7".to_string());
    let event = EventId("evt-100".to_string());

    let store = Arc::new(InMemoryVettingStore::default());
    let directory = Arc::new(InMemoryRoleDirectory::default());
    directory.grant_administrator(&admin);
    let cache = Arc::new(TtlStatusCache::new(StdDuration::from_secs(300)));
    let service = VettingWorkflowService::new(
        store.clone(),
        directory.clone(),
        Arc::new(LoggingStatusNotifier),
        cache.clone(),
    );
    let gate = AccessControlGate::new(
        store.clone(),
        cache,
        AccessGateConfig {
            support_contact: "support@membergate.org".to_string(),
        },
    );
    let lookup = StatusLookup::new(store.clone());

    println!("Membership vetting workflow demo");

    let id = ApplicationId("app-0001".to_string());
    store.seed(sample_application("app-0001", "tok-0001", Some("user-7")));
    println!("- Seeded application {} for {} (under review)", id.0, applicant.0);

    println!("\nAccess check while under review");
    let decision = gate.can_user_rsvp(&applicant, &event)?;
    println!("- RSVP allowed: {}", decision.allowed);

    println!("\nAttempting to skip straight to a decision");
    match service.request_transition(&id, VettingStatus::Approved, Some("skip"), &admin) {
        Ok(_) => println!("- Unexpectedly succeeded"),
        Err(err) => println!("- Rejected: {err}"),
    }

    println!("\nWalking the review path");
    let record =
        service.request_transition(&id, VettingStatus::InterviewApproved, Some("strong refs"), &admin)?;
    println!("- Status now {}", record.status);

    let when = Utc::now() + Duration::days(7);
    let record = service.schedule_interview(&id, when, "Community Center, Room 101", &admin)?;
    println!(
        "- Interview scheduled for {} at {}",
        when.format("%Y-%m-%d %H:%M UTC"),
        record
            .interview_location
            .as_deref()
            .unwrap_or("(unset)")
    );

    let record = service.request_transition(&id, VettingStatus::FinalReview, None, &admin)?;
    println!("- Status now {}", record.status);

    let record = service.approve(&id, &admin, "Interview passed")?;
    println!(
        "- Status now {} (decision recorded {})",
        record.status,
        record
            .decision_made_at
            .map(|at| at.to_rfc3339())
            .unwrap_or_default()
    );
    println!(
        "- Directory role for {}: {}",
        applicant.0,
        directory.role_of(&applicant).unwrap_or_default()
    );

    println!("\nA second applicant lands on hold");
    let held = ApplicationId("app-0002".to_string());
    store.seed(sample_application("app-0002", "tok-0002", Some("user-9")));
    service.put_on_hold(&held, "References missing", "Provide two references", &admin)?;
    let blocked = UserId("user-9".to_string());
    let decision = gate.can_user_purchase_ticket(&blocked, &event)?;
    println!("- Ticket purchase allowed: {}", decision.allowed);
    if let Some(message) = &decision.user_message {
        println!("  Message shown to the applicant: {message}");
    }

    println!("\nPublic status payloads");
    for token in ["tok-0001", "tok-0002"] {
        match lookup.status_by_token(&StatusToken(token.to_string())) {
            Ok(view) => match serde_json::to_string_pretty(&view) {
                Ok(json) => println!("{json}"),
                Err(err) => println!("  payload unavailable: {err}"),
            },
            Err(err) => println!("  {err}"),
        }
    }

    if args.show_audit {
        println!("\nAudit trail");
        for entry in store.audit_entries() {
            println!(
                "- [{}] {} {} -> {} ({})",
                entry.recorded_at.format("%H:%M:%S"),
                entry.action.label(),
                entry.old_value.as_deref().unwrap_or("-"),
                entry.new_value.as_deref().unwrap_or("-"),
                entry.notes
            );
        }
    }

    Ok(())
}
