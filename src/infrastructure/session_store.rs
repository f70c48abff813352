use crate::domain::models::{CompletionRecord, LeaderboardEntry};
use crate::infrastructure::credential_store::SessionTokenStore;
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use url::Url;

const SESSIONS_TABLE: &str = "study_sessions";
const LEADERBOARD_VIEW: &str = "leaderboard";

/// Remote store for completed work sessions plus the aggregate
/// leaderboard read model derived from them server-side.
#[async_trait]
pub trait StudySessionStore: Send + Sync {
    /// Persists one completion as its own row. Never an update or upsert.
    async fn insert_session(&self, record: &CompletionRecord) -> Result<(), InfraError>;

    /// Returns at most `limit` entries ordered by total study minutes
    /// descending.
    async fn query_top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, InfraError>;
}

pub struct ReqwestStudySessionStore<S>
where
    S: SessionTokenStore,
{
    client: Client,
    rest_url: String,
    anon_key: String,
    token_store: Arc<S>,
}

impl<S> ReqwestStudySessionStore<S>
where
    S: SessionTokenStore,
{
    pub fn new(
        rest_url: impl Into<String>,
        anon_key: impl Into<String>,
        token_store: Arc<S>,
    ) -> Self {
        Self {
            client: Client::new(),
            rest_url: rest_url.into(),
            anon_key: anon_key.into(),
            token_store,
        }
    }

    fn table_endpoint(&self, table: &str) -> Result<Url, InfraError> {
        let mut url = Url::parse(&self.rest_url)
            .map_err(|error| InfraError::Store(format!("invalid rest base url: {error}")))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| InfraError::Store("rest base URL cannot be a base".to_string()))?;
            segments.push(table);
        }
        Ok(url)
    }

    /// Row-level security scopes inserts to the signed-in user, so the
    /// session token is preferred over the anon key when one is stored.
    fn bearer_token(&self) -> Result<String, InfraError> {
        let session = self.token_store.load_session()?;
        Ok(session
            .map(|session| session.access_token)
            .filter(|token| !token.trim().is_empty())
            .unwrap_or_else(|| self.anon_key.clone()))
    }

    fn store_http_error(status: reqwest::StatusCode, body: &str) -> InfraError {
        let message = if body.trim().is_empty() {
            format!("study store api error: http {}", status.as_u16())
        } else {
            format!(
                "study store api error: http {}; body={body}",
                status.as_u16()
            )
        };
        InfraError::Store(message)
    }
}

#[async_trait]
impl<S> StudySessionStore for ReqwestStudySessionStore<S>
where
    S: SessionTokenStore,
{
    async fn insert_session(&self, record: &CompletionRecord) -> Result<(), InfraError> {
        record.validate().map_err(InfraError::Store)?;

        let endpoint = self.table_endpoint(SESSIONS_TABLE)?;
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(self.bearer_token()?)
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|error| {
                InfraError::Store(format!("network error while inserting session: {error}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            InfraError::Store(format!("failed reading session insert response: {error}"))
        })?;

        if !status.is_success() {
            return Err(Self::store_http_error(status, &body));
        }
        Ok(())
    }

    async fn query_top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, InfraError> {
        let endpoint = self.table_endpoint(LEADERBOARD_VIEW)?;
        let response = self
            .client
            .get(endpoint)
            .query(&[
                ("select", "*".to_string()),
                ("order", "total_study_minutes.desc".to_string()),
                ("limit", limit.to_string()),
            ])
            .bearer_auth(self.bearer_token()?)
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|error| {
                InfraError::Store(format!("network error while querying leaderboard: {error}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            InfraError::Store(format!("failed reading leaderboard response: {error}"))
        })?;

        if !status.is_success() {
            return Err(Self::store_http_error(status, &body));
        }

        let parsed: Vec<LeaderboardEntry> = serde_json::from_str(&body).map_err(|error| {
            InfraError::Store(format!("invalid leaderboard payload: {error}; body={body}"))
        })?;

        Ok(parsed
            .into_iter()
            .filter(|entry| entry.validate().is_ok())
            .collect())
    }
}
