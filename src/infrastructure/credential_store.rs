use crate::domain::models::AuthSession;
use crate::infrastructure::error::InfraError;
use std::sync::Mutex;

pub trait SessionTokenStore: Send + Sync {
    fn save_session(&self, session: &AuthSession) -> Result<(), InfraError>;
    fn load_session(&self) -> Result<Option<AuthSession>, InfraError>;
    fn delete_session(&self) -> Result<(), InfraError>;
}

/// Persists the auth session in the OS keyring so the timer can attribute
/// completions across app launches without re-prompting for credentials.
#[derive(Debug, Clone)]
pub struct KeyringSessionTokenStore {
    service_name: String,
    account_name: String,
}

impl KeyringSessionTokenStore {
    pub fn new(service_name: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            account_name: account_name.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, InfraError> {
        keyring::Entry::new(&self.service_name, &self.account_name)
            .map_err(|error| InfraError::Credential(error.to_string()))
    }
}

impl Default for KeyringSessionTokenStore {
    fn default() -> Self {
        Self::new("studyflow.auth.session", "default")
    }
}

impl SessionTokenStore for KeyringSessionTokenStore {
    fn save_session(&self, session: &AuthSession) -> Result<(), InfraError> {
        let payload = serde_json::to_string(session)
            .map_err(|error| InfraError::Credential(error.to_string()))?;
        self.entry()?
            .set_password(&payload)
            .map_err(|error| InfraError::Credential(error.to_string()))
    }

    fn load_session(&self) -> Result<Option<AuthSession>, InfraError> {
        let payload = match self.entry()?.get_password() {
            Ok(value) => value,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(error) => return Err(InfraError::Credential(error.to_string())),
        };

        let session = serde_json::from_str::<AuthSession>(&payload)
            .map_err(|error| InfraError::Credential(error.to_string()))?;
        Ok(Some(session))
    }

    fn delete_session(&self) -> Result<(), InfraError> {
        match self.entry()?.delete_credential() {
            Ok(_) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(InfraError::Credential(error.to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemorySessionTokenStore {
    session: Mutex<Option<AuthSession>>,
}

impl SessionTokenStore for InMemorySessionTokenStore {
    fn save_session(&self, session: &AuthSession) -> Result<(), InfraError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|error| InfraError::Credential(format!("in-memory lock poisoned: {error}")))?;
        *guard = Some(session.clone());
        Ok(())
    }

    fn load_session(&self) -> Result<Option<AuthSession>, InfraError> {
        let guard = self
            .session
            .lock()
            .map_err(|error| InfraError::Credential(format!("in-memory lock poisoned: {error}")))?;
        Ok(guard.clone())
    }

    fn delete_session(&self) -> Result<(), InfraError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|error| InfraError::Credential(format!("in-memory lock poisoned: {error}")))?;
        *guard = None;
        Ok(())
    }
}
