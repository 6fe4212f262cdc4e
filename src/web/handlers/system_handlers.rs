// src/web/handlers/system_handlers.rs
use crate::error::{ApiResult, AppError};
use crate::web::types::*;

use rocket::fs::NamedFile;
use rocket::serde::json::Json;
use rocket::State;
use tracing::warn;

pub async fn index_handler(config: &State<ServerConfig>) -> ApiResult<NamedFile> {
    let path = config.static_dir.join("index.html");
    NamedFile::open(&path).await.map_err(|e| {
        warn!("Cannot serve {}: {}", path.display(), e);
        AppError::NotFound("index.html not found".to_string())
    })
}

pub async fn auth_env_handler(config: &State<ServerConfig>) -> Json<AuthEnvResponse> {
    Json(AuthEnvResponse {
        url: config.identity_url.clone().unwrap_or_default(),
        anon_key: config.identity_anon_key.clone().unwrap_or_default(),
    })
}
