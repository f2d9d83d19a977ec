use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::domain::{StatusToken, UserId, VettingApplication};
use super::repository::ApplicationStore;

/// Applicant-facing projection of an application's review progress. Reviewer
/// notes are intentionally absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub application_number: String,
    pub status: &'static str,
    pub status_description: &'static str,
    pub progress_percent: u8,
}

impl StatusView {
    fn of(application: &VettingApplication) -> Self {
        Self {
            application_number: application.application_number.clone(),
            status: application.status.label(),
            status_description: application.status.description(),
            progress_percent: application.status.progress_percent(),
        }
    }
}

/// Error surfaced by the self-service lookup. Store failures collapse into
/// `NotFound` so applicants never see persistence detail.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("status unavailable")]
    NotFound,
}

/// Read-only status projections for applicants, by opaque token or by the
/// linked account.
pub struct StatusLookup<S> {
    store: Arc<S>,
}

impl<S> StatusLookup<S>
where
    S: ApplicationStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn status_by_token(&self, token: &StatusToken) -> Result<StatusView, LookupError> {
        let application = self
            .store
            .find_by_token(token)
            .map_err(|err| {
                warn!(error = %err, "status lookup failed");
                LookupError::NotFound
            })?
            .ok_or(LookupError::NotFound)?;
        Ok(StatusView::of(&application))
    }

    pub fn status_for_user(&self, user: &UserId) -> Result<StatusView, LookupError> {
        let application = self
            .store
            .find_by_user(user)
            .map_err(|err| {
                warn!(user = %user.0, error = %err, "status lookup failed");
                LookupError::NotFound
            })?
            .ok_or(LookupError::NotFound)?;
        Ok(StatusView::of(&application))
    }
}
