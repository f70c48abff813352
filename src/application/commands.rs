use crate::application::bootstrap::bootstrap_workspace;
use crate::application::leaderboard::{LeaderboardRow, LeaderboardView};
use crate::application::recorder::{RecordOutcome, SessionRecorder};
use crate::application::scheduler::{spawn_ticker, TickerHandle};
use crate::domain::clock::{ClockEvent, SessionClock};
use crate::domain::models::TimerConfiguration;
use crate::infrastructure::config::{
    read_store_settings, read_timer_configuration, save_timer_configuration,
};
use crate::infrastructure::credential_store::{KeyringSessionTokenStore, SessionTokenStore};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::identity::{IdentityProvider, ReqwestIdentityClient};
use crate::infrastructure::session_store::{ReqwestStudySessionStore, StudySessionStore};
use chrono::Utc;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const WORK_SAVED_NOTICE: &str = "Work session completed!";
const SAVE_FAILED_NOTICE: &str = "Failed to save session";
const SIGN_IN_REQUIRED_NOTICE: &str = "Please log in to track your sessions";
const BREAK_OVER_NOTICE: &str = "Break time over! Ready for another session?";
const SETTINGS_UPDATED_NOTICE: &str = "Settings updated!";

pub struct AppState {
    config_dir: PathBuf,
    logs_dir: PathBuf,
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn StudySessionStore>,
    token_store: Arc<dyn SessionTokenStore>,
    leaderboard_limit: usize,
    runtime: Mutex<RuntimeState>,
    refresh_counter: AtomicU64,
    notices: Mutex<Vec<Notice>>,
    log_guard: Mutex<()>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let settings = read_store_settings(&bootstrap.config_dir)?;

        let token_store = Arc::new(KeyringSessionTokenStore::default());
        let identity = Arc::new(ReqwestIdentityClient::new(
            settings.auth_url.clone(),
            settings.anon_key.clone(),
            Arc::clone(&token_store),
        ));
        let store = Arc::new(ReqwestStudySessionStore::new(
            settings.rest_url.clone(),
            settings.anon_key.clone(),
            Arc::clone(&token_store),
        ));

        Self::with_collaborators(workspace_root, identity, store, token_store)
    }

    /// Constructor with injected collaborators; `new` wires the reqwest
    /// and keyring implementations through here.
    pub fn with_collaborators(
        workspace_root: PathBuf,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn StudySessionStore>,
        token_store: Arc<dyn SessionTokenStore>,
    ) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let configuration = read_timer_configuration(&bootstrap.config_dir)?;
        let settings = read_store_settings(&bootstrap.config_dir)?;

        Ok(Self {
            config_dir: bootstrap.config_dir,
            logs_dir: bootstrap.logs_dir,
            identity,
            store,
            token_store,
            leaderboard_limit: settings.leaderboard_limit,
            runtime: Mutex::new(RuntimeState {
                clock: SessionClock::new(configuration),
                ticker: None,
            }),
            refresh_counter: AtomicU64::new(0),
            notices: Mutex::new(Vec::new()),
            log_guard: Mutex::new(()),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }

    fn push_notice(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

struct RuntimeState {
    clock: SessionClock,
    ticker: Option<TickerHandle>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient user-visible notice, the backend side of the original toasts.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn success(message: &str) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.to_string(),
        }
    }

    fn error(message: &str) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimerStateResponse {
    pub phase: String,
    pub remaining_seconds: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub running: bool,
}

pub fn start_timer_impl(state: &Arc<AppState>) -> Result<TimerStateResponse, InfraError> {
    let mut runtime = lock_runtime(state)?;
    if !runtime.clock.is_running() {
        runtime.clock.start();
        runtime.ticker = Some(spawn_ticker(Arc::clone(state)));
        state.log_info(
            "start_timer",
            &format!(
                "started {} countdown at {}s",
                runtime.clock.phase().as_str(),
                runtime.clock.remaining_seconds()
            ),
        );
    }
    Ok(to_timer_state_response(&runtime.clock))
}

pub fn pause_timer_impl(state: &AppState) -> Result<TimerStateResponse, InfraError> {
    let mut runtime = lock_runtime(state)?;
    if let Some(ticker) = runtime.ticker.take() {
        ticker.stop();
    }
    runtime.clock.pause();
    state.log_info(
        "pause_timer",
        &format!("paused with {}s remaining", runtime.clock.remaining_seconds()),
    );
    Ok(to_timer_state_response(&runtime.clock))
}

pub fn reset_timer_impl(state: &AppState) -> Result<TimerStateResponse, InfraError> {
    let mut runtime = lock_runtime(state)?;
    if let Some(ticker) = runtime.ticker.take() {
        ticker.stop();
    }
    runtime.clock.reset();
    state.log_info(
        "reset_timer",
        &format!("reset {} countdown", runtime.clock.phase().as_str()),
    );
    Ok(to_timer_state_response(&runtime.clock))
}

pub fn apply_configuration_impl(
    state: &AppState,
    work_minutes: u32,
    break_minutes: u32,
) -> Result<TimerStateResponse, InfraError> {
    let configuration = TimerConfiguration {
        work_minutes,
        break_minutes,
    };

    let mut runtime = lock_runtime(state)?;
    if let Err(message) = configuration.validate() {
        state.push_notice(Notice::error(&message));
        state.log_error("apply_configuration", &message);
        return Err(InfraError::InvalidConfig(message));
    }

    // Valid configuration: a hard reset point for any in-progress run.
    if let Some(ticker) = runtime.ticker.take() {
        ticker.stop();
    }
    runtime
        .clock
        .apply_configuration(configuration)
        .map_err(InfraError::InvalidConfig)?;
    let response = to_timer_state_response(&runtime.clock);
    drop(runtime);

    save_timer_configuration(&state.config_dir, &configuration)?;
    state.push_notice(Notice::success(SETTINGS_UPDATED_NOTICE));
    state.log_info(
        "apply_configuration",
        &format!("applied work={work_minutes}m break={break_minutes}m"),
    );
    Ok(response)
}

/// Advances the clock by one elapsed second. Called by the spawned
/// ticker; kept callable directly so the transition is testable without
/// any scheduler. Completion recording is fire-and-forget: the phase
/// transition never waits on the store.
pub fn tick_timer_impl(state: &Arc<AppState>) -> Result<TimerStateResponse, InfraError> {
    let (event, response) = {
        let mut runtime = lock_runtime(state)?;
        let event = runtime.clock.tick();
        (event, to_timer_state_response(&runtime.clock))
    };

    match event {
        Some(ClockEvent::WorkIntervalCompleted { duration_minutes }) => {
            state.log_info(
                "tick_timer",
                &format!("work interval completed after {duration_minutes}m"),
            );
            spawn_completion_recording(Arc::clone(state), duration_minutes);
        }
        Some(ClockEvent::BreakIntervalCompleted) => {
            state.push_notice(Notice::success(BREAK_OVER_NOTICE));
            state.log_info("tick_timer", "break interval completed");
        }
        None => {}
    }
    Ok(response)
}

pub fn get_timer_state_impl(state: &AppState) -> Result<TimerStateResponse, InfraError> {
    let runtime = lock_runtime(state)?;
    Ok(to_timer_state_response(&runtime.clock))
}

pub async fn get_leaderboard_impl(state: &AppState) -> Result<Vec<LeaderboardRow>, InfraError> {
    let view = LeaderboardView::new(Arc::clone(&state.store));
    view.top_rows(state.leaderboard_limit).await
}

/// Monotonically increasing counter bumped after every successfully
/// persisted session; hosts re-render the leaderboard when it changes.
pub fn leaderboard_version_impl(state: &AppState) -> u64 {
    state.refresh_counter.load(Ordering::SeqCst)
}

pub fn drain_notices_impl(state: &AppState) -> Result<Vec<Notice>, InfraError> {
    let mut notices = state
        .notices
        .lock()
        .map_err(|error| InfraError::InvalidConfig(format!("notice lock poisoned: {error}")))?;
    Ok(std::mem::take(&mut *notices))
}

pub fn sign_out_impl(state: &AppState) -> Result<(), InfraError> {
    state.token_store.delete_session()?;
    state.log_info("sign_out", "cleared stored auth session");
    Ok(())
}

fn spawn_completion_recording(state: Arc<AppState>, duration_minutes: u32) {
    tokio::spawn(async move {
        let hook_state = Arc::clone(&state);
        let recorder = SessionRecorder::new(Arc::clone(&state.identity), Arc::clone(&state.store))
            .with_refresh_hook(Arc::new(move || {
                hook_state.refresh_counter.fetch_add(1, Ordering::SeqCst);
            }));

        match recorder.record_work_interval(duration_minutes).await {
            Ok(RecordOutcome::Saved { user_id }) => {
                state.push_notice(Notice::success(WORK_SAVED_NOTICE));
                state.log_info(
                    "record_session",
                    &format!("saved {duration_minutes}m work session for user_id={user_id}"),
                );
            }
            Ok(RecordOutcome::NotAuthenticated) => {
                state.push_notice(Notice::error(SIGN_IN_REQUIRED_NOTICE));
                state.log_error("record_session", "completion dropped: no authenticated user");
            }
            Err(error) => {
                state.push_notice(Notice::error(SAVE_FAILED_NOTICE));
                state.log_error("record_session", &error.to_string());
            }
        }
    });
}

fn lock_runtime(state: &AppState) -> Result<MutexGuard<'_, RuntimeState>, InfraError> {
    state
        .runtime
        .lock()
        .map_err(|error| InfraError::InvalidConfig(format!("runtime lock poisoned: {error}")))
}

fn to_timer_state_response(clock: &SessionClock) -> TimerStateResponse {
    TimerStateResponse {
        phase: clock.phase().as_str().to_string(),
        remaining_seconds: clock.remaining_seconds(),
        minutes: clock.remaining_seconds() / 60,
        seconds: clock.remaining_seconds() % 60,
        running: clock.is_running(),
    }
}
