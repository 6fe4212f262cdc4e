// src/web/types.rs
use rocket::serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::core::{PipelineState, StopOutcome, SyncOutcome};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub static_dir: PathBuf,
    pub identity_url: Option<String>,
    pub identity_anon_key: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Public identity provider settings for the browser client
#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct AuthEnvResponse {
    #[serde(rename = "SUPABASE_URL")]
    pub url: String,
    #[serde(rename = "SUPABASE_ANON_KEY")]
    pub anon_key: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SyncResponse {
    pub synced: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<SyncOutcome> for SyncResponse {
    fn from(outcome: SyncOutcome) -> Self {
        Self {
            synced: outcome.synced,
            message: outcome.message,
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct PipelineStatusResponse {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restricted: Option<bool>,
}

impl PipelineStatusResponse {
    pub fn from_state(state: PipelineState, restricted: bool) -> Self {
        Self {
            running: state.is_running(),
            pid: state.pid(),
            restricted: restricted.then_some(true),
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct PipelineStopResponse {
    pub running: bool,
    pub message: String,
}

impl From<StopOutcome> for PipelineStopResponse {
    fn from(outcome: StopOutcome) -> Self {
        Self {
            running: false,
            message: outcome.message().to_string(),
        }
    }
}

/// Body of `POST /api/pipeline/start`
#[derive(Debug, Default, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StartRequest {
    #[serde(default)]
    pub config: Option<Value>,
}

impl StartRequest {
    /// Lenient parse: anything that is not a JSON object means "no body"
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// The inline configuration, when it is a non-empty object
    pub fn inline_config(self) -> Option<Map<String, Value>> {
        match self.config {
            Some(Value::Object(map)) if !map.is_empty() => Some(map),
            _ => None,
        }
    }
}

/// Lenient parse of a config update: empty or invalid bodies mean `{}`
pub fn parse_update(body: &str) -> Value {
    match serde_json::from_str::<Value>(body) {
        Ok(value @ Value::Object(_)) => value,
        _ => Value::Object(Map::new()),
    }
}
