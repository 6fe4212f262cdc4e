// src/core/file_store.rs
//! Anonymous configuration kept in a single local JSON file

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::core::schema::default_config;
use crate::core::{FsOps, Materializer};
use crate::types::BotConfig;

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
    materializer: Materializer,
    restricted: bool,
}

impl FileConfigStore {
    pub fn new(path: PathBuf, materializer: Materializer, restricted: bool) -> Self {
        Self {
            path,
            materializer,
            restricted,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored file, else the bot's own modules, else defaults
    pub async fn load(&self) -> BotConfig {
        match self.read_file().await {
            Ok(Some(config)) => return config,
            Ok(None) => debug!("No config file at {}", self.path.display()),
            Err(e) => warn!("Ignoring unreadable config file: {:#}", e),
        }
        self.reference_or_default().await
    }

    /// Live values from the bot checkout when it can be read, else defaults
    pub async fn reference_or_default(&self) -> BotConfig {
        if self.restricted || !self.materializer.reference_available() {
            return default_config();
        }
        self.materializer.read().await
    }

    async fn read_file(&self) -> Result<Option<BotConfig>> {
        let Some(content) = FsOps::read_optional(&self.path).await? else {
            return Ok(None);
        };
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", self.path.display()))?;
        Ok(Some(config))
    }

    /// Overwrite the file with the full configuration
    pub async fn save(&self, config: &BotConfig) -> Result<()> {
        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize config")?;
        FsOps::write_file_safe(&self.path, &content).await?;
        info!("Saved config to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::Section;
    use serde_json::json;

    fn store(dir: &Path) -> FileConfigStore {
        let materializer = Materializer::new(dir.join("reference"), "python3");
        FileConfigStore::new(dir.join("config.json"), materializer, false)
    }

    #[tokio::test]
    async fn test_missing_file_and_reference_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store(dir.path()).load().await, default_config());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let mut config = default_config();
        config.set_field(Section::Personals, "first_name", json!("Grace"));
        store.save(&config).await.unwrap();

        assert_eq!(store.load().await, config);
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\n  \"personals\": {"));
    }

    #[tokio::test]
    async fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        std::fs::write(store.path(), "{ not json").unwrap();

        assert_eq!(store.load().await, default_config());
    }

    #[tokio::test]
    async fn test_stored_config_is_passed_through_unvalidated() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        std::fs::write(store.path(), r#"{"search": {"switch_number": "lots"}}"#).unwrap();

        let config = store.load().await;
        assert_eq!(config.field(Section::Search, "switch_number"), Some(&json!("lots")));
        assert!(config.section(Section::Personals).is_none());
    }

    #[tokio::test]
    async fn test_restricted_mode_skips_reference() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("reference")).unwrap();
        let materializer =
            Materializer::new(dir.path().join("reference"), "definitely-not-a-python-binary");
        let store = FileConfigStore::new(dir.path().join("config.json"), materializer, true);

        assert_eq!(store.reference_or_default().await, default_config());
    }
}
