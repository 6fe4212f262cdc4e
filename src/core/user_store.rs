// src/core/user_store.rs
//! Signed-in users' configuration, one remote row per user id

use anyhow::Result;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::remote_store::SharedRemoteStore;
use crate::core::schema::default_config;
use crate::types::BotConfig;

#[derive(Clone, Default)]
pub struct UserConfigStore {
    remote: Option<SharedRemoteStore>,
}

impl UserConfigStore {
    pub fn new(remote: Option<SharedRemoteStore>) -> Self {
        Self { remote }
    }

    /// Stored row, or defaults when there is no store, no row, or an error
    pub async fn load(&self, user_id: &str) -> BotConfig {
        let Some(remote) = &self.remote else {
            return default_config();
        };

        match remote.fetch_config(user_id).await {
            Ok(Some(Value::Object(stored))) if !stored.is_empty() => BotConfig::from_map(stored),
            Ok(_) => {
                debug!("No stored config for user {}", user_id);
                default_config()
            }
            Err(e) => {
                warn!("Failed to load config for user {}: {:#}", user_id, e);
                default_config()
            }
        }
    }

    /// Upsert the user's row. Without a store this is a no-op.
    pub async fn save(&self, user_id: &str, config: &BotConfig) -> Result<()> {
        let Some(remote) = &self.remote else {
            debug!("No remote store; config for user {} not persisted", user_id);
            return Ok(());
        };

        remote
            .upsert_config(user_id, &Value::from(config.clone()), Utc::now())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::Section;
    use crate::core::Database;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_without_store_uses_defaults() {
        let store = UserConfigStore::new(None);
        assert_eq!(store.load("u1").await, default_config());
        assert!(store.save("u1", &default_config()).await.is_ok());
    }

    #[tokio::test]
    async fn test_save_and_load_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("store.db")).await.unwrap();
        let store = UserConfigStore::new(Some(Arc::new(db)));

        let mut config = default_config();
        config.set_field(Section::Search, "switch_number", json!(12));
        store.save("u1", &config).await.unwrap();

        assert_eq!(store.load("u1").await, config);
        assert_eq!(store.load("u2").await, default_config());
    }

    #[tokio::test]
    async fn test_empty_stored_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("store.db")).await.unwrap();
        let store = UserConfigStore::new(Some(Arc::new(db)));

        store.save("u1", &BotConfig::default()).await.unwrap();
        assert_eq!(store.load("u1").await, default_config());
    }
}
