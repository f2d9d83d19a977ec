use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

use membergate::workflows::vetting::{
    ApplicationId, ApplicationStore, AuditLogEntry, DirectoryError, NotifyError, RoleDirectory,
    StatusNotifier, StatusToken, StoreError, UserId, VettingApplication, VettingStatus,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct StoreInner {
    applications: HashMap<ApplicationId, VettingApplication>,
    audit: Vec<AuditLogEntry>,
}

/// In-memory application store. One lock covers the record map and the audit
/// trail, which both serializes same-application writers and makes the
/// save+audit pair atomic.
#[derive(Default)]
pub(crate) struct InMemoryVettingStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryVettingStore {
    pub(crate) fn seed(&self, record: VettingApplication) {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .applications
            .insert(record.id.clone(), record);
    }

    pub(crate) fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.inner.lock().expect("store mutex poisoned").audit.clone()
    }
}

impl ApplicationStore for InMemoryVettingStore {
    fn find_by_id(&self, id: &ApplicationId) -> Result<Option<VettingApplication>, StoreError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        Ok(guard.applications.get(id).cloned())
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

/// In-memory role directory seeded with the bootstrap administrator.
#[derive(Default)]
pub(crate) struct InMemoryRoleDirectory {
    administrators: Mutex<HashSet<UserId>>,
    roles: Mutex<HashMap<UserId, String>>,
}

impl InMemoryRoleDirectory {
    pub(crate) fn grant_administrator(&self, user: &UserId) {
        self.administrators
            .lock()
            .expect("directory mutex poisoned")
            .insert(user.clone());
    }

    pub(crate) fn role_of(&self, user: &UserId) -> Option<String> {
        self.roles
            .lock()
            .expect("directory mutex poisoned")
            .get(user)
            .cloned()
    }
}

impl RoleDirectory for InMemoryRoleDirectory {
    fn is_administrator(&self, user: &UserId) -> Result<bool, DirectoryError> {
        let guard = self.administrators.lock().expect("directory mutex poisoned");
        Ok(guard.contains(user))
    }

    fn elevate_to_vetted_member(&self, user: &UserId) -> Result<(), DirectoryError> {
        self.roles
            .lock()
            .expect("directory mutex poisoned")
            .insert(user.clone(), "VettedMember".to_string());
        Ok(())
    }
}

/// Notifier that records delivery intent in the service log. Stands in for
/// the platform's mail adapter, which lives outside this service.
#[derive(Default)]
pub(crate) struct LoggingStatusNotifier;

impl StatusNotifier for LoggingStatusNotifier {
    fn send_status_update(
        &self,
        application: &VettingApplication,
        recipient_email: &str,
        _recipient_name: &str,
        new_status: VettingStatus,
    ) -> Result<bool, NotifyError> {
        info!(
            application = %application.application_number,
            recipient = %recipient_email,
            status = %new_status,
            "status update notification"
        );
        Ok(true)
    }

    fn send_interview_scheduled(
        &self,
        application: &VettingApplication,
        recipient_email: &str,
        _recipient_name: &str,
        scheduled_for: DateTime<Utc>,
        location: &str,
    ) -> Result<bool, NotifyError> {
        info!(
            application = %application.application_number,
            recipient = %recipient_email,
            scheduled_for = %scheduled_for.to_rfc3339(),
            location,
            "interview notification"
        );
        Ok(true)
    }
}
