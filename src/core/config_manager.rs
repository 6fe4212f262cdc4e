// src/core/config_manager.rs
//! Service configuration: paths, identity provider, remote store, runtime mode

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::FsOps;

pub const DEFAULT_INTERPRETER: &str = "python3";
pub const BOT_ENTRYPOINT: &str = "runAiBot.py";
pub const APPLIED_HISTORY_CSV: &str = "all excels/all_applied_applications_history.csv";

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: EnvironmentConfig,
    pub identity: IdentityConfig,
    pub remote_store: RemoteStoreConfig,
    pub bot: BotRuntimeConfig,
    /// Hosted mode: read-only filesystem outside the temp dir, no subprocesses
    pub restricted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    /// Checkout of the external bot
    pub reference_path: PathBuf,
    /// Anonymous configuration file
    pub config_json_path: PathBuf,
    /// Front-end assets
    pub static_path: PathBuf,
    /// Bot stdout/stderr
    pub pipeline_log_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: EnvironmentConfig,
}

#[derive(Debug, Clone, Default)]
pub struct IdentityConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RemoteStoreConfig {
    pub url: Option<String>,
    pub service_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BotRuntimeConfig {
    pub interpreter: String,
    pub entrypoint: String,
}

impl EnvironmentConfig {
    fn under(base_dir: &Path) -> Self {
        Self {
            reference_path: base_dir.join("reference"),
            config_json_path: base_dir.join("config.json"),
            static_path: base_dir.join("static"),
            pipeline_log_path: base_dir.join("pipeline.log"),
        }
    }

    fn resolved(self, base_dir: &Path) -> Self {
        Self {
            reference_path: FsOps::normalize_path(base_dir, &self.reference_path),
            config_json_path: FsOps::normalize_path(base_dir, &self.config_json_path),
            static_path: FsOps::normalize_path(base_dir, &self.static_path),
            pipeline_log_path: FsOps::normalize_path(base_dir, &self.pipeline_log_path),
        }
    }

    pub fn applied_history_csv(&self) -> PathBuf {
        self.reference_path.join(APPLIED_HISTORY_CSV)
    }
}

impl ConfigManager {
    /// Load from the process environment and an optional `config.yaml`
    pub fn load() -> Result<Self> {
        let base_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::from_lookup(&base_dir, |key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup; `base_dir` anchors
    /// relative paths and holds the optional `config.yaml`.
    pub fn from_lookup<F>(base_dir: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let restricted = var("VERCEL").as_deref() == Some("1")
            || matches!(
                var("RESTRICTED_MODE").map(|v| v.to_lowercase()).as_deref(),
                Some("1" | "true" | "yes")
            );

        let env_name = var("ENVIRONMENT").unwrap_or_else(|| "local".to_string());
        info!("Loading configuration for environment: {}", env_name);

        let mut environment = Self::load_environment(base_dir, &env_name)?;

        if let Some(path) = var("REFERENCE_DIR") {
            environment.reference_path = FsOps::normalize_path(base_dir, Path::new(&path));
        }
        if let Some(path) = var("STATIC_DIR") {
            environment.static_path = FsOps::normalize_path(base_dir, Path::new(&path));
        }
        if let Some(path) = var("CONFIG_JSON_PATH") {
            environment.config_json_path = FsOps::normalize_path(base_dir, Path::new(&path));
        } else if restricted {
            environment.config_json_path = std::env::temp_dir().join("config.json");
        }

        let identity = IdentityConfig {
            url: var("SUPABASE_URL"),
            anon_key: var("SUPABASE_ANON_KEY"),
            jwt_secret: var("SUPABASE_JWT_SECRET"),
        };

        let remote_store = RemoteStoreConfig {
            url: var("REMOTE_STORE_URL").or_else(|| identity.url.clone()),
            service_key: var("SUPABASE_SERVICE_ROLE_KEY"),
        };

        let bot = BotRuntimeConfig {
            interpreter: var("BOT_PYTHON").unwrap_or_else(|| DEFAULT_INTERPRETER.to_string()),
            entrypoint: BOT_ENTRYPOINT.to_string(),
        };

        Ok(Self {
            environment,
            identity,
            remote_store,
            bot,
            restricted,
        })
    }

    fn load_environment(base_dir: &Path, env_name: &str) -> Result<EnvironmentConfig> {
        let config_path = base_dir.join("config.yaml");
        if !config_path.exists() {
            return Ok(EnvironmentConfig::under(base_dir));
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config.yaml")?;
        let config_file: ConfigFile =
            serde_yaml::from_str(&content).context("Failed to parse config.yaml")?;

        let env_config = match env_name {
            "production" => config_file.production,
            _ => config_file.local,
        };
        Ok(env_config.resolved(base_dir))
    }

    pub fn applied_history_csv(&self) -> PathBuf {
        self.environment.applied_history_csv()
    }
}
