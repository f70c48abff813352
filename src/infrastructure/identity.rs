use crate::domain::models::{AuthSession, UserIdentity};
use crate::infrastructure::credential_store::SessionTokenStore;
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use url::Url;

const SESSION_EXPIRY_LEEWAY_SECONDS: i64 = 30;

/// One-shot "who is logged in right now" query, resolved at completion
/// time. The recorder treats `None` as "drop the record and notify".
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Result<Option<UserIdentity>, InfraError>;
}

/// Resolves the current user against the hosted auth endpoint using the
/// locally stored session token. A missing, expired or rejected session
/// reads as "no user" rather than an error.
pub struct ReqwestIdentityClient<S>
where
    S: SessionTokenStore,
{
    client: Client,
    auth_url: String,
    anon_key: String,
    token_store: Arc<S>,
}

impl<S> ReqwestIdentityClient<S>
where
    S: SessionTokenStore,
{
    pub fn new(
        auth_url: impl Into<String>,
        anon_key: impl Into<String>,
        token_store: Arc<S>,
    ) -> Self {
        Self {
            client: Client::new(),
            auth_url: auth_url.into(),
            anon_key: anon_key.into(),
            token_store,
        }
    }

    fn user_endpoint(&self) -> Result<Url, InfraError> {
        let mut url = Url::parse(&self.auth_url)
            .map_err(|error| InfraError::Identity(format!("invalid auth base url: {error}")))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| InfraError::Identity("auth base URL cannot be a base".to_string()))?;
            segments.push("user");
        }
        Ok(url)
    }

    fn valid_session(&self) -> Result<Option<AuthSession>, InfraError> {
        let Some(session) = self.token_store.load_session()? else {
            return Ok(None);
        };
        if !session.is_valid_at(chrono::Utc::now(), SESSION_EXPIRY_LEEWAY_SECONDS) {
            return Ok(None);
        }
        Ok(Some(session))
    }
}

#[derive(Debug, serde::Deserialize)]
struct UserResponse {
    id: Option<String>,
    email: Option<String>,
}

#[async_trait]
impl<S> IdentityProvider for ReqwestIdentityClient<S>
where
    S: SessionTokenStore,
{
    async fn current_user(&self) -> Result<Option<UserIdentity>, InfraError> {
        let Some(session) = self.valid_session()? else {
            return Ok(None);
        };

        let endpoint = self.user_endpoint()?;
        let response = self
            .client
            .get(endpoint)
            .bearer_auth(&session.access_token)
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|error| {
                InfraError::Identity(format!("network error while resolving user: {error}"))
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Ok(None);
        }

        let body = response.text().await.map_err(|error| {
            InfraError::Identity(format!("failed reading user response: {error}"))
        })?;
        if !status.is_success() {
            return Err(InfraError::Identity(format!(
                "auth api error: http {}; body={body}",
                status.as_u16()
            )));
        }

        let parsed: UserResponse = serde_json::from_str(&body).map_err(|error| {
            InfraError::Identity(format!("invalid user payload: {error}; body={body}"))
        })?;

        let Some(id) = parsed
            .id
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
        else {
            return Ok(None);
        };

        Ok(Some(UserIdentity {
            id,
            email: parsed
                .email
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
        }))
    }
}
