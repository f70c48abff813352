use crate::domain::models::TimerConfiguration;
use crate::infrastructure::error::InfraError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const TIMER_JSON: &str = "timer.json";
const STORE_JSON: &str = "store.json";

const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub rest_url: String,
    pub auth_url: String,
    pub anon_key: String,
    pub leaderboard_limit: usize,
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([
        (
            TIMER_JSON,
            serde_json::json!({
                "schema": 1,
                "workMinutes": 25,
                "breakMinutes": 5
            }),
        ),
        (
            STORE_JSON,
            serde_json::json!({
                "schema": 1,
                "restUrl": "http://127.0.0.1:54321/rest/v1",
                "authUrl": "http://127.0.0.1:54321/auth/v1",
                "anonKey": "",
                "leaderboardLimit": DEFAULT_LEADERBOARD_LIMIT
            }),
        ),
    ])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

fn read_minutes(value: &serde_json::Value, key: &str, path: &Path) -> Result<u32, InfraError> {
    value
        .get(key)
        .and_then(serde_json::Value::as_u64)
        .and_then(|minutes| u32::try_from(minutes).ok())
        .ok_or_else(|| {
            InfraError::InvalidConfig(format!("missing or invalid {key} in {}", path.display()))
        })
}

pub fn read_timer_configuration(config_dir: &Path) -> Result<TimerConfiguration, InfraError> {
    let path = config_dir.join(TIMER_JSON);
    let timer = read_config(&path)?;
    let configuration = TimerConfiguration {
        work_minutes: read_minutes(&timer, "workMinutes", &path)?,
        break_minutes: read_minutes(&timer, "breakMinutes", &path)?,
    };
    configuration
        .validate()
        .map_err(InfraError::InvalidConfig)?;
    Ok(configuration)
}

pub fn save_timer_configuration(
    config_dir: &Path,
    configuration: &TimerConfiguration,
) -> Result<(), InfraError> {
    configuration
        .validate()
        .map_err(InfraError::InvalidConfig)?;
    let value = serde_json::json!({
        "schema": 1,
        "workMinutes": configuration.work_minutes,
        "breakMinutes": configuration.break_minutes
    });
    let formatted = serde_json::to_string_pretty(&value)?;
    fs::write(config_dir.join(TIMER_JSON), format!("{formatted}\n"))?;
    Ok(())
}

pub fn read_store_settings(config_dir: &Path) -> Result<StoreSettings, InfraError> {
    let path = config_dir.join(STORE_JSON);
    let store = read_config(&path)?;

    let read_url = |key: &str| -> Result<String, InfraError> {
        store
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
            .ok_or_else(|| {
                InfraError::InvalidConfig(format!("missing or empty {key} in {}", path.display()))
            })
    };

    Ok(StoreSettings {
        rest_url: read_url("restUrl")?,
        auth_url: read_url("authUrl")?,
        anon_key: store
            .get("anonKey")
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        leaderboard_limit: store
            .get("leaderboardLimit")
            .and_then(serde_json::Value::as_u64)
            .and_then(|limit| usize::try_from(limit).ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT),
    })
}
