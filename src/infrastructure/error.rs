use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Identity error: {0}")]
    Identity(String),
    #[error("Store error: {0}")]
    Store(String),
    #[error("Credential error: {0}")]
    Credential(String),
}
