pub mod bootstrap;
pub mod commands;
pub mod leaderboard;
pub mod recorder;
pub mod scheduler;
