use crate::domain::models::CompletionRecord;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::identity::IdentityProvider;
use crate::infrastructure::session_store::StudySessionStore;
use std::sync::Arc;

pub type RefreshHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Saved { user_id: String },
    NotAuthenticated,
}

/// Attributes a completed work interval to the current user and persists
/// it as one independent row.
///
/// Delivery is at-most-once by design: an unauthenticated completion is
/// dropped with a notice, and a failed insert is dropped without retry.
/// The refresh hook fires only after a successful insert so dependent
/// views re-query the aggregates.
pub struct SessionRecorder {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn StudySessionStore>,
    refresh_hook: Option<RefreshHook>,
}

impl SessionRecorder {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn StudySessionStore>) -> Self {
        Self {
            identity,
            store,
            refresh_hook: None,
        }
    }

    pub fn with_refresh_hook(mut self, refresh_hook: RefreshHook) -> Self {
        self.refresh_hook = Some(refresh_hook);
        self
    }

    pub async fn record_work_interval(
        &self,
        duration_minutes: u32,
    ) -> Result<RecordOutcome, InfraError> {
        let Some(user) = self.identity.current_user().await? else {
            return Ok(RecordOutcome::NotAuthenticated);
        };

        let record = CompletionRecord::work(user.id.clone(), duration_minutes);
        record.validate().map_err(InfraError::InvalidConfig)?;
        self.store.insert_session(&record).await?;

        if let Some(refresh_hook) = &self.refresh_hook {
            refresh_hook();
        }
        Ok(RecordOutcome::Saved { user_id: user.id })
    }
}
