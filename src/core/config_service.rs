// src/core/config_service.rs
//! Picks the store for a caller: signed-in users get their remote row,
//! anonymous callers share the local file.

use anyhow::Result;
use serde_json::Value;
use tracing::{info, warn};

use crate::core::{FileConfigStore, Materializer, UserConfigStore};
use crate::types::BotConfig;

#[derive(Clone)]
pub struct ConfigService {
    file_store: FileConfigStore,
    user_store: UserConfigStore,
    materializer: Materializer,
}

impl ConfigService {
    pub fn new(
        file_store: FileConfigStore,
        user_store: UserConfigStore,
        materializer: Materializer,
    ) -> Self {
        Self {
            file_store,
            user_store,
            materializer,
        }
    }

    pub fn materializer(&self) -> &Materializer {
        &self.materializer
    }

    pub async fn load(&self, user_id: Option<&str>) -> BotConfig {
        match user_id {
            Some(user_id) => self.user_store.load(user_id).await,
            None => self.file_store.load().await,
        }
    }

    /// Merge a partial update into the caller's configuration and persist it
    pub async fn update(&self, user_id: Option<&str>, update: &Value) -> Result<BotConfig> {
        let mut config = self.load(user_id).await;
        config.merge(update);
        self.persist(user_id, &config).await?;
        Ok(config)
    }

    /// Replace the caller's configuration with the bot's current modules
    pub async fn reload_from_reference(&self, user_id: Option<&str>) -> Result<BotConfig> {
        let config = self.file_store.reference_or_default().await;
        self.persist(user_id, &config).await?;
        info!("Reloaded config from {}", self.materializer.reference_dir().display());
        Ok(config)
    }

    /// Local file writes propagate errors. Remote writes are best effort: a
    /// failure is logged and the caller still receives its configuration.
    async fn persist(&self, user_id: Option<&str>, config: &BotConfig) -> Result<()> {
        match user_id {
            Some(user_id) => {
                if let Err(e) = self.user_store.save(user_id, config).await {
                    warn!("Config for user {} not persisted: {:#}", user_id, e);
                }
                Ok(())
            }
            None => self.file_store.save(config).await,
        }
    }
}
