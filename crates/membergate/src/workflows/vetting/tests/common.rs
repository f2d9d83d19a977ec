use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::workflows::vetting::access::{AccessControlGate, AccessGateConfig};
use crate::workflows::vetting::cache::TtlStatusCache;
use crate::workflows::vetting::domain::{
    ApplicationId, AuditLogEntry, StatusToken, UserId, VettingApplication, VettingStatus,
};
use crate::workflows::vetting::public::StatusLookup;
use crate::workflows::vetting::repository::{
    ApplicationStore, DirectoryError, NotifyError, RoleDirectory, StatusNotifier, StoreError,
};
use crate::workflows::vetting::router::{vetting_router, VettingRouterState};
use crate::workflows::vetting::service::VettingWorkflowService;

pub(super) const ADMIN: &str = "admin-1";
pub(super) const APPLICANT: &str = "user-7";
pub(super) const SUPPORT_CONTACT: &str = "support@membergate.org";

pub(super) fn admin() -> UserId {
    UserId(ADMIN.to_string())
}

pub(super) fn applicant() -> UserId {
    UserId(APPLICANT.to_string())
}

pub(super) fn application(status: VettingStatus) -> VettingApplication {
    let now = Utc::now();
    VettingApplication {
        id: ApplicationId("app-1".to_string()),
        application_number: "VET-20260801-0001".to_string(),
        status_token: StatusToken("tok-1".to_string()),
        user_id: None,
        display_name: "Alex Doe".to_string(),
        email: "alex@example.com".to_string(),
        status,
        admin_notes: String::new(),
        decision_made_at: if status.is_terminal() { Some(now) } else { None },
        interview_scheduled_for: None,
        interview_location: None,
        submitted_at: now,
        updated_at: now,
    }
}

pub(super) fn linked_application(status: VettingStatus) -> VettingApplication {
    let mut record = application(status);
    record.user_id = Some(applicant());
    record
}

#[derive(Default)]
struct MemoryStoreInner {
    applications: HashMap<ApplicationId, VettingApplication>,
    audit: Vec<AuditLogEntry>,
}

/// In-memory store holding applications and the audit trail behind one lock,
/// which makes the save+audit pair trivially atomic.
#[derive(Default)]
pub(super) struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    pub(super) fn seed(&self, record: VettingApplication) {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .applications
            .insert(record.id.clone(), record);
    }

    pub(super) fn get(&self, id: &ApplicationId) -> Option<VettingApplication> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .applications
            .get(id)
            .cloned()
    }

    pub(super) fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.inner.lock().expect("store mutex poisoned").audit.clone()
    }
}

impl ApplicationStore for MemoryStore {
    fn find_by_id(&self, id: &ApplicationId) -> Result<Option<VettingApplication>, StoreError> {
        Ok(self.get(id))
    }

    fn find_by_user(&self, user: &UserId) -> Result<Option<VettingApplication>, StoreError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        Ok(guard
            .applications
            .values()
            .find(|record| record.user_id.as_ref() == Some(user))
            .cloned())
    }

    fn find_by_token(
        &self,
        token: &StatusToken,
    ) -> Result<Option<VettingApplication>, StoreError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        Ok(guard
            .applications
            .values()
            .find(|record| &record.status_token == token)
            .cloned())
    }

    fn save_with_audit(
        &self,
        application: &VettingApplication,
        entry: AuditLogEntry,
    ) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        guard
            .applications
            .insert(application.id.clone(), application.clone());
        guard.audit.push(entry);
        Ok(())
    }

    fn append_audit(&self, entry: AuditLogEntry) -> Result<(), StoreError> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .audit
            .push(entry);
        Ok(())
    }
}

/// Store wrapper whose audit append fails, for exercising the gate's
/// non-blocking denial logging.
pub(super) struct FlakyAuditStore {
    pub(super) inner: Arc<MemoryStore>,
}

impl ApplicationStore for FlakyAuditStore {
    fn find_by_id(&self, id: &ApplicationId) -> Result<Option<VettingApplication>, StoreError> {
        self.inner.find_by_id(id)
    }

    fn find_by_user(&self, user: &UserId) -> Result<Option<VettingApplication>, StoreError> {
        self.inner.find_by_user(user)
    }

    fn find_by_token(
        &self,
        token: &StatusToken,
    ) -> Result<Option<VettingApplication>, StoreError> {
        self.inner.find_by_token(token)
    }

    fn save_with_audit(
        &self,
        application: &VettingApplication,
        entry: AuditLogEntry,
    ) -> Result<(), StoreError> {
        self.inner.save_with_audit(application, entry)
    }

    fn append_audit(&self, _entry: AuditLogEntry) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("audit log offline".to_string()))
    }
}

/// Store that is entirely offline.
pub(super) struct UnavailableStore;

impl ApplicationStore for UnavailableStore {
    fn find_by_id(&self, _id: &ApplicationId) -> Result<Option<VettingApplication>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn find_by_user(&self, _user: &UserId) -> Result<Option<VettingApplication>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn find_by_token(
        &self,
        _token: &StatusToken,
    ) -> Result<Option<VettingApplication>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn save_with_audit(
        &self,
        _application: &VettingApplication,
        _entry: AuditLogEntry,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn append_audit(&self, _entry: AuditLogEntry) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
struct DirectoryInner {
    administrators: HashSet<UserId>,
    roles: HashMap<UserId, String>,
}

#[derive(Default)]
pub(super) struct MemoryDirectory {
    inner: Mutex<DirectoryInner>,
}

impl MemoryDirectory {
    pub(super) fn grant_administrator(&self, user: &UserId) {
        self.inner
            .lock()
            .expect("directory mutex poisoned")
            .administrators
            .insert(user.clone());
    }

    pub(super) fn role_of(&self, user: &UserId) -> Option<String> {
        self.inner
            .lock()
            .expect("directory mutex poisoned")
            .roles
            .get(user)
            .cloned()
    }
}

impl RoleDirectory for MemoryDirectory {
    fn is_administrator(&self, user: &UserId) -> Result<bool, DirectoryError> {
        let guard = self.inner.lock().expect("directory mutex poisoned");
        Ok(guard.administrators.contains(user))
    }

    fn elevate_to_vetted_member(&self, user: &UserId) -> Result<(), DirectoryError> {
        let mut guard = self.inner.lock().expect("directory mutex poisoned");
        guard.roles.insert(user.clone(), "VettedMember".to_string());
        Ok(())
    }
}

/// Directory that accepts any actor as an administrator but fails every role
/// grant.
pub(super) struct FailingDirectory;

impl RoleDirectory for FailingDirectory {
    fn is_administrator(&self, _user: &UserId) -> Result<bool, DirectoryError> {
        Ok(true)
    }

    fn elevate_to_vetted_member(&self, _user: &UserId) -> Result<(), DirectoryError> {
        Err(DirectoryError::Unavailable("identity provider down".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    status_updates: Mutex<Vec<(ApplicationId, VettingStatus)>>,
    interviews: Mutex<Vec<(ApplicationId, DateTime<Utc>, String)>>,
}

impl MemoryNotifier {
    pub(super) fn status_updates(&self) -> Vec<(ApplicationId, VettingStatus)> {
        self.status_updates
            .lock()
            .expect("notifier mutex poisoned")
            .clone()
    }

    pub(super) fn interviews(&self) -> Vec<(ApplicationId, DateTime<Utc>, String)> {
        self.interviews
            .lock()
            .expect("notifier mutex poisoned")
            .clone()
    }
}

impl StatusNotifier for MemoryNotifier {
    fn send_status_update(
        &self,
        application: &VettingApplication,
        _recipient_email: &str,
        _recipient_name: &str,
        new_status: VettingStatus,
    ) -> Result<bool, NotifyError> {
        self.status_updates
            .lock()
            .expect("notifier mutex poisoned")
            .push((application.id.clone(), new_status));
        Ok(true)
    }

    fn send_interview_scheduled(
        &self,
        application: &VettingApplication,
        _recipient_email: &str,
        _recipient_name: &str,
        scheduled_for: DateTime<Utc>,
        location: &str,
    ) -> Result<bool, NotifyError> {
        self.interviews
            .lock()
            .expect("notifier mutex poisoned")
            .push((application.id.clone(), scheduled_for, location.to_string()));
        Ok(true)
    }
}

pub(super) struct FailingNotifier;

impl StatusNotifier for FailingNotifier {
    fn send_status_update(
        &self,
        _application: &VettingApplication,
        _recipient_email: &str,
        _recipient_name: &str,
        _new_status: VettingStatus,
    ) -> Result<bool, NotifyError> {
        Err(NotifyError::Transport("smtp relay down".to_string()))
    }

    fn send_interview_scheduled(
        &self,
        _application: &VettingApplication,
        _recipient_email: &str,
        _recipient_name: &str,
        _scheduled_for: DateTime<Utc>,
        _location: &str,
    ) -> Result<bool, NotifyError> {
        Err(NotifyError::Transport("smtp relay down".to_string()))
    }
}

pub(super) type Service =
    VettingWorkflowService<MemoryStore, MemoryDirectory, MemoryNotifier, TtlStatusCache>;
pub(super) type Gate = AccessControlGate<MemoryStore, TtlStatusCache>;

pub(super) struct Harness {
    pub(super) service: Arc<Service>,
    pub(super) gate: Arc<Gate>,
    pub(super) lookup: Arc<StatusLookup<MemoryStore>>,
    pub(super) store: Arc<MemoryStore>,
    pub(super) directory: Arc<MemoryDirectory>,
    pub(super) notifier: Arc<MemoryNotifier>,
    pub(super) cache: Arc<TtlStatusCache>,
}

pub(super) fn harness() -> Harness {
    let store = Arc::new(MemoryStore::default());
    let directory = Arc::new(MemoryDirectory::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let cache = Arc::new(TtlStatusCache::new(Duration::from_secs(60)));
    directory.grant_administrator(&admin());

    let service = Arc::new(VettingWorkflowService::new(
        store.clone(),
        directory.clone(),
        notifier.clone(),
        cache.clone(),
    ));
    let gate = Arc::new(AccessControlGate::new(
        store.clone(),
        cache.clone(),
        AccessGateConfig {
            support_contact: SUPPORT_CONTACT.to_string(),
        },
    ));
    let lookup = Arc::new(StatusLookup::new(store.clone()));

    Harness {
        service,
        gate,
        lookup,
        store,
        directory,
        notifier,
        cache,
    }
}

pub(super) fn router(harness: &Harness) -> axum::Router {
    vetting_router(VettingRouterState {
        service: harness.service.clone(),
        gate: harness.gate.clone(),
        lookup: harness.lookup.clone(),
    })
}
