pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::commands::{
    apply_configuration_impl, drain_notices_impl, get_leaderboard_impl, get_timer_state_impl,
    leaderboard_version_impl, pause_timer_impl, reset_timer_impl, sign_out_impl, start_timer_impl,
    tick_timer_impl, AppState, Notice, NoticeLevel, TimerStateResponse,
};
pub use application::leaderboard::{LeaderboardRow, LeaderboardView};
pub use application::recorder::{RecordOutcome, SessionRecorder};
pub use application::scheduler::{spawn_ticker, TickerHandle};
pub use domain::clock::{ClockEvent, SessionClock};
pub use domain::models::{
    format_study_time, AuthSession, CompletionRecord, LeaderboardEntry, Phase, TimerConfiguration,
    UserIdentity,
};
pub use infrastructure::credential_store::{
    InMemorySessionTokenStore, KeyringSessionTokenStore, SessionTokenStore,
};
pub use infrastructure::error::InfraError;
pub use infrastructure::identity::{IdentityProvider, ReqwestIdentityClient};
pub use infrastructure::session_store::{ReqwestStudySessionStore, StudySessionStore};
