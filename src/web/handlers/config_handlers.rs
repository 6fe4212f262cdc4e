// src/web/handlers/config_handlers.rs
use crate::auth::Identity;
use crate::core::ConfigService;
use crate::error::ApiResult;
use crate::types::BotConfig;
use crate::web::types::parse_update;

use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

pub async fn get_config_handler(identity: Identity, configs: &State<ConfigService>) -> Json<BotConfig> {
    Json(configs.load(identity.user_id()).await)
}

pub async fn update_config_handler(
    identity: Identity,
    body: String,
    configs: &State<ConfigService>,
) -> ApiResult<Json<BotConfig>> {
    let update = parse_update(&body);
    let config = configs.update(identity.user_id(), &update).await?;
    info!(
        "Config updated for {}",
        identity.user_id().unwrap_or("anonymous caller")
    );
    Ok(Json(config))
}

pub async fn load_from_reference_handler(
    identity: Identity,
    configs: &State<ConfigService>,
) -> ApiResult<Json<BotConfig>> {
    let config = configs.reload_from_reference(identity.user_id()).await?;
    Ok(Json(config))
}
