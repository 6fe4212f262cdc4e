// src/core/remote_store.rs
//! Per-user persistence backends.
//!
//! The hosted deployment talks to a PostgREST endpoint (Supabase); a
//! `sqlite:` URL selects an embedded SQLite file with the same two tables.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::core::config_manager::RemoteStoreConfig;
use crate::core::{Database, ServiceClient};
use crate::types::{AppliedJob, AppliedJobRow};

#[rocket::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Stored configuration for a user, if a row exists
    async fn fetch_config(&self, user_id: &str) -> Result<Option<Value>>;

    /// Insert or replace the user's configuration row
    async fn upsert_config(
        &self,
        user_id: &str,
        config: &Value,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Applied jobs for a user, newest first
    async fn applied_jobs(&self, user_id: &str) -> Result<Vec<AppliedJob>>;

    /// Insert or update rows keyed by `(user_id, job_id)`. Returns rows written.
    async fn upsert_applied_jobs(&self, user_id: &str, rows: &[AppliedJobRow]) -> Result<usize>;
}

pub type SharedRemoteStore = Arc<dyn RemoteStore>;

/// Build the configured backend, or `None` when no store is configured.
pub async fn connect(config: &RemoteStoreConfig) -> Result<Option<SharedRemoteStore>> {
    let Some(url) = config.url.as_deref() else {
        info!("No remote store configured; signed-in users get defaults");
        return Ok(None);
    };

    if let Some(path) = url.strip_prefix("sqlite:") {
        let path = path.trim_start_matches("//");
        let database = Database::new(std::path::Path::new(path)).await?;
        info!("Using SQLite remote store at {}", path);
        return Ok(Some(Arc::new(database)));
    }

    match config.service_key.as_deref() {
        Some(key) => {
            let client = ServiceClient::new(url.to_string(), key.to_string())?;
            info!("Using REST remote store at {}", url);
            Ok(Some(Arc::new(client)))
        }
        None => {
            info!("Remote store URL set without a service key; remote store disabled");
            Ok(None)
        }
    }
}
