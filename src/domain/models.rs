use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_WORK_MINUTES: u32 = 1;
pub const MAX_WORK_MINUTES: u32 = 60;
pub const MIN_BREAK_MINUTES: u32 = 1;
pub const MAX_BREAK_MINUTES: u32 = 30;

pub const WORK_SESSION_TYPE: &str = "work";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn flipped(self) -> Self {
        match self {
            Self::Work => Self::Break,
            Self::Break => Self::Work,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Break => "break",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerConfiguration {
    pub work_minutes: u32,
    pub break_minutes: u32,
}

impl Default for TimerConfiguration {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            break_minutes: 5,
        }
    }
}

impl TimerConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.work_minutes < MIN_WORK_MINUTES || self.work_minutes > MAX_WORK_MINUTES {
            return Err(format!(
                "work_minutes must be between {MIN_WORK_MINUTES} and {MAX_WORK_MINUTES}"
            ));
        }
        if self.break_minutes < MIN_BREAK_MINUTES || self.break_minutes > MAX_BREAK_MINUTES {
            return Err(format!(
                "break_minutes must be between {MIN_BREAK_MINUTES} and {MAX_BREAK_MINUTES}"
            ));
        }
        Ok(())
    }

    pub fn duration_seconds(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_minutes * 60,
            Phase::Break => self.break_minutes * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionRecord {
    pub user_id: String,
    pub duration_minutes: u32,
    pub session_type: String,
}

impl CompletionRecord {
    pub fn work(user_id: impl Into<String>, duration_minutes: u32) -> Self {
        Self {
            user_id: user_id.into(),
            duration_minutes,
            session_type: WORK_SESSION_TYPE.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.user_id, "session.user_id")?;
        if self.duration_minutes == 0 {
            return Err("session.duration_minutes must be > 0".to_string());
        }
        if self.session_type != WORK_SESSION_TYPE {
            return Err(format!(
                "session.session_type must be \"{WORK_SESSION_TYPE}\""
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub total_study_minutes: u32,
    pub total_sessions: u32,
}

impl LeaderboardEntry {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "leaderboard.id")?;
        validate_non_empty(&self.username, "leaderboard.username")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    pub fn is_valid_at(&self, now: DateTime<Utc>, leeway_seconds: i64) -> bool {
        if self.access_token.trim().is_empty() {
            return false;
        }
        match self.expires_at {
            Some(expires_at) => expires_at > now + chrono::Duration::seconds(leeway_seconds),
            None => true,
        }
    }
}

/// Formats accumulated study minutes the way the leaderboard shows them,
/// e.g. `125` becomes `"2h 5m"` and `45` stays `"45m"`.
pub fn format_study_time(total_minutes: u32) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn sample_entry() -> LeaderboardEntry {
        LeaderboardEntry {
            id: "usr-1".to_string(),
            username: "quietfox".to_string(),
            avatar_url: None,
            total_study_minutes: 125,
            total_sessions: 5,
        }
    }

    #[test]
    fn default_configuration_is_twenty_five_five() {
        let config = TimerConfiguration::default();
        assert_eq!(config.work_minutes, 25);
        assert_eq!(config.break_minutes, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn configuration_rejects_out_of_bounds_durations() {
        let too_long = TimerConfiguration {
            work_minutes: 61,
            break_minutes: 5,
        };
        assert!(too_long.validate().is_err());

        let zero_break = TimerConfiguration {
            work_minutes: 25,
            break_minutes: 0,
        };
        assert!(zero_break.validate().is_err());
    }

    #[test]
    fn duration_follows_the_phase() {
        let config = TimerConfiguration::default();
        assert_eq!(config.duration_seconds(Phase::Work), 25 * 60);
        assert_eq!(config.duration_seconds(Phase::Break), 5 * 60);
    }

    #[test]
    fn completion_record_validate_rejects_blank_user() {
        let record = CompletionRecord::work("   ", 25);
        assert!(record.validate().is_err());
        assert!(CompletionRecord::work("usr-1", 25).validate().is_ok());
    }

    #[test]
    fn completion_record_validate_rejects_foreign_session_type() {
        let mut record = CompletionRecord::work("usr-1", 25);
        record.session_type = "break".to_string();
        assert!(record.validate().is_err());
    }

    #[test]
    fn leaderboard_entry_validate_rejects_blank_username() {
        let mut entry = sample_entry();
        entry.username = " ".to_string();
        assert!(entry.validate().is_err());
    }

    #[test]
    fn auth_session_validity_respects_expiry_and_leeway() {
        let now = fixed_time("2026-02-16T12:00:00Z");
        let session = AuthSession {
            access_token: "token".to_string(),
            expires_at: Some(fixed_time("2026-02-16T12:01:00Z")),
        };
        assert!(session.is_valid_at(now, 30));
        assert!(!session.is_valid_at(now, 90));

        let blank = AuthSession {
            access_token: "  ".to_string(),
            expires_at: None,
        };
        assert!(!blank.is_valid_at(now, 0));
    }

    #[test]
    fn study_time_formatting_matches_leaderboard_display() {
        assert_eq!(format_study_time(0), "0m");
        assert_eq!(format_study_time(45), "45m");
        assert_eq!(format_study_time(60), "1h 0m");
        assert_eq!(format_study_time(125), "2h 5m");
    }

    #[test]
    fn models_support_serde_roundtrip() {
        let config = TimerConfiguration::default();
        let record = CompletionRecord::work("usr-1", 25);
        let entry = sample_entry();
        let session = AuthSession {
            access_token: "token".to_string(),
            expires_at: Some(fixed_time("2026-02-16T12:00:00Z")),
        };

        let config_roundtrip: TimerConfiguration =
            serde_json::from_str(&serde_json::to_string(&config).expect("serialize config"))
                .expect("deserialize config");
        let record_roundtrip: CompletionRecord =
            serde_json::from_str(&serde_json::to_string(&record).expect("serialize record"))
                .expect("deserialize record");
        let entry_roundtrip: LeaderboardEntry =
            serde_json::from_str(&serde_json::to_string(&entry).expect("serialize entry"))
                .expect("deserialize entry");
        let session_roundtrip: AuthSession =
            serde_json::from_str(&serde_json::to_string(&session).expect("serialize session"))
                .expect("deserialize session");

        assert_eq!(config_roundtrip, config);
        assert_eq!(record_roundtrip, record);
        assert_eq!(entry_roundtrip, entry);
        assert_eq!(session_roundtrip, session);
    }

    #[test]
    fn phase_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Phase::Work).expect("serialize phase"),
            "\"work\""
        );
        assert_eq!(Phase::Break.as_str(), "break");
        assert_eq!(Phase::Work.flipped(), Phase::Break);
        assert_eq!(Phase::Break.flipped(), Phase::Work);
    }

    // Feature: studyflow, Property 1: in-bounds configurations always validate
    proptest! {
        #[test]
        fn property1_in_bounds_configuration_validates(
            work_minutes in MIN_WORK_MINUTES..=MAX_WORK_MINUTES,
            break_minutes in MIN_BREAK_MINUTES..=MAX_BREAK_MINUTES
        ) {
            let config = TimerConfiguration { work_minutes, break_minutes };
            prop_assert!(config.validate().is_ok());
            prop_assert_eq!(config.duration_seconds(Phase::Work), work_minutes * 60);
            prop_assert_eq!(config.duration_seconds(Phase::Break), break_minutes * 60);
        }
    }

    // Feature: studyflow, Property 2: formatted study time preserves the total
    proptest! {
        #[test]
        fn property2_formatted_study_time_preserves_total(total_minutes in 0u32..100_000u32) {
            let formatted = format_study_time(total_minutes);
            let reconstructed = if let Some((hours, rest)) = formatted.split_once("h ") {
                let hours: u32 = hours.parse().expect("hour component");
                let minutes: u32 = rest.trim_end_matches('m').parse().expect("minute component");
                prop_assert!(minutes < 60);
                hours * 60 + minutes
            } else {
                formatted.trim_end_matches('m').parse().expect("minute component")
            };
            prop_assert_eq!(reconstructed, total_minutes);
        }
    }
}
