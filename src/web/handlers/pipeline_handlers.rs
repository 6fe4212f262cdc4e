// src/web/handlers/pipeline_handlers.rs
use crate::auth::Identity;
use crate::core::{ConfigService, ProcessController};
use crate::error::ApiResult;
use crate::types::BotConfig;
use crate::web::types::{PipelineStatusResponse, PipelineStopResponse, StartRequest};

use anyhow::Context;
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

pub async fn pipeline_status_handler(
    controller: &State<ProcessController>,
) -> Json<PipelineStatusResponse> {
    let state = controller.status().await;
    Json(PipelineStatusResponse::from_state(
        state,
        controller.is_restricted(),
    ))
}

/// Materialize the configuration into the bot checkout, then spawn it.
/// The process lock is held throughout so two starts cannot interleave.
pub async fn start_pipeline_handler(
    identity: Identity,
    body: String,
    configs: &State<ConfigService>,
    controller: &State<ProcessController>,
) -> ApiResult<Json<PipelineStatusResponse>> {
    let mut guard = controller.lock().await;
    guard.ensure_can_start()?;

    let config = match StartRequest::parse(&body).inline_config() {
        Some(inline) => BotConfig::from_map(inline),
        None => configs.load(identity.user_id()).await,
    };

    configs
        .materializer()
        .write(&config)
        .await
        .context("Failed to write config")?;

    let pid = guard.spawn().await?;
    info!("Pipeline started with pid {}", pid);

    Ok(Json(PipelineStatusResponse {
        running: true,
        pid: Some(pid),
        restricted: None,
    }))
}

pub async fn stop_pipeline_handler(
    controller: &State<ProcessController>,
) -> Json<PipelineStopResponse> {
    let outcome = controller.stop().await;
    info!("{}", outcome.message());
    Json(outcome.into())
}
