// src/core/mod.rs
//! Configuration stores, the bot file bridge, process control and job history

pub mod applied_jobs;
pub mod config_manager;
pub mod config_service;
pub mod database;
pub mod file_store;
pub mod fs_ops;
pub mod materializer;
pub mod process;
pub mod python_literal;
pub mod remote_store;
pub mod schema;
pub mod service_client;
pub mod user_store;

pub use applied_jobs::{AppliedJobsService, SyncOutcome};
pub use config_manager::ConfigManager;
pub use config_service::ConfigService;
pub use database::Database;
pub use file_store::FileConfigStore;
pub use fs_ops::FsOps;
pub use materializer::Materializer;
pub use process::{LaunchConfig, PipelineState, ProcessController, StopOutcome};
pub use remote_store::{RemoteStore, SharedRemoteStore};
pub use service_client::ServiceClient;
pub use user_store::UserConfigStore;
