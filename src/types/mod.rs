// src/types/mod.rs
pub mod applied_job;
pub mod bot_config;

pub use applied_job::{AppliedJob, AppliedJobRow};
pub use bot_config::BotConfig;
