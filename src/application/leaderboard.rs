use crate::domain::models::{format_study_time, LeaderboardEntry};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::session_store::StudySessionStore;
use serde::Serialize;
use std::sync::Arc;

/// Render-ready leaderboard row; `study_time` is pre-formatted the way
/// the board displays it ("2h 5m").
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub username: String,
    pub total_sessions: u32,
    pub study_time: String,
}

/// Read-only view over the aggregate leaderboard. It never computes the
/// per-user totals itself; it re-queries the remote read model and ranks
/// the entries in the order the store returns them.
pub struct LeaderboardView {
    store: Arc<dyn StudySessionStore>,
}

impl LeaderboardView {
    pub fn new(store: Arc<dyn StudySessionStore>) -> Self {
        Self { store }
    }

    pub async fn top_rows(&self, limit: usize) -> Result<Vec<LeaderboardRow>, InfraError> {
        let entries = self.store.query_top(limit).await?;
        Ok(build_rows(entries))
    }
}

fn build_rows(entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardRow> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| LeaderboardRow {
            rank: index + 1,
            username: entry.username,
            total_sessions: entry.total_sessions,
            study_time: format_study_time(entry.total_study_minutes),
        })
        .collect()
}
