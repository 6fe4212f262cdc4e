// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use types::*;

use crate::auth::{AuthConfig, Identity};
use crate::core::process::DEFAULT_STOP_TIMEOUT_SECS;
use crate::core::{
    remote_store, AppliedJobsService, ConfigManager, ConfigService, FileConfigStore,
    LaunchConfig, Materializer, ProcessController, SharedRemoteStore, UserConfigStore,
};
use crate::error::ApiResult;
use crate::types::{AppliedJob, BotConfig};
use anyhow::Result;
use rocket::data::{Limits, ToByteUnit};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::{FileServer, NamedFile, Options};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, put, routes, Build, Request, Response, Rocket, State};
use std::time::Duration;
use tracing::{error, info};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

// ===== Routes =====

#[get("/")]
pub async fn index(config: &State<ServerConfig>) -> ApiResult<NamedFile> {
    handlers::index_handler(config).await
}

#[get("/auth/env")]
pub async fn auth_env(config: &State<ServerConfig>) -> Json<AuthEnvResponse> {
    handlers::auth_env_handler(config).await
}

#[get("/config")]
pub async fn get_config(identity: Identity, configs: &State<ConfigService>) -> Json<BotConfig> {
    handlers::get_config_handler(identity, configs).await
}

#[put("/config", data = "<body>")]
pub async fn put_config(
    identity: Identity,
    body: String,
    configs: &State<ConfigService>,
) -> ApiResult<Json<BotConfig>> {
    handlers::update_config_handler(identity, body, configs).await
}

#[post("/config", data = "<body>")]
pub async fn post_config(
    identity: Identity,
    body: String,
    configs: &State<ConfigService>,
) -> ApiResult<Json<BotConfig>> {
    handlers::update_config_handler(identity, body, configs).await
}

#[post("/config/load-from-reference")]
pub async fn load_from_reference(
    identity: Identity,
    configs: &State<ConfigService>,
) -> ApiResult<Json<BotConfig>> {
    handlers::load_from_reference_handler(identity, configs).await
}

#[get("/applied-jobs")]
pub async fn applied_jobs(
    identity: Identity,
    jobs: &State<AppliedJobsService>,
) -> ApiResult<Json<Vec<AppliedJob>>> {
    handlers::applied_jobs_handler(identity, jobs).await
}

#[post("/applied-jobs/sync")]
pub async fn sync_applied_jobs(
    identity: Identity,
    jobs: &State<AppliedJobsService>,
) -> ApiResult<Json<SyncResponse>> {
    handlers::sync_applied_jobs_handler(identity, jobs).await
}

#[get("/pipeline/status")]
pub async fn pipeline_status(
    controller: &State<ProcessController>,
) -> Json<PipelineStatusResponse> {
    handlers::pipeline_status_handler(controller).await
}

#[post("/pipeline/start", data = "<body>")]
pub async fn start_pipeline(
    identity: Identity,
    body: String,
    configs: &State<ConfigService>,
    controller: &State<ProcessController>,
) -> ApiResult<Json<PipelineStatusResponse>> {
    handlers::start_pipeline_handler(identity, body, configs, controller).await
}

#[post("/pipeline/stop")]
pub async fn stop_pipeline(controller: &State<ProcessController>) -> Json<PipelineStopResponse> {
    handlers::stop_pipeline_handler(controller).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// ===== Error catchers =====

#[rocket::catch(400)]
pub fn bad_request() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Invalid request format"))
}

#[rocket::catch(401)]
pub fn unauthorized() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Authentication required"))
}

#[rocket::catch(404)]
pub fn not_found(req: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new(format!("No route for {}", req.uri().path())))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Request body could not be processed"))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Internal server error"))
}

// ===== Server assembly =====

/// Wire every service from the loaded configuration. `remote` is passed in so
/// callers (and tests) decide which backend signed-in users get.
pub fn build_rocket(config: &ConfigManager, remote: Option<SharedRemoteStore>) -> Rocket<Build> {
    let env = &config.environment;

    let materializer = Materializer::new(env.reference_path.clone(), config.bot.interpreter.clone());
    let file_store = FileConfigStore::new(
        env.config_json_path.clone(),
        materializer.clone(),
        config.restricted,
    );
    let config_service = ConfigService::new(
        file_store,
        UserConfigStore::new(remote.clone()),
        materializer,
    );

    let jobs = AppliedJobsService::new(config.applied_history_csv(), remote);

    let controller = ProcessController::new(LaunchConfig {
        interpreter: config.bot.interpreter.clone(),
        working_dir: env.reference_path.clone(),
        entrypoint: config.bot.entrypoint.clone(),
        log_path: Some(env.pipeline_log_path.clone()),
        restricted: config.restricted,
        stop_timeout: Duration::from_secs(DEFAULT_STOP_TIMEOUT_SECS),
    });

    let server_config = ServerConfig {
        static_dir: env.static_path.clone(),
        identity_url: config.identity.url.clone(),
        identity_anon_key: config.identity.anon_key.clone(),
    };

    let limits = Limits::default()
        .limit("string", 2.mebibytes())
        .limit("json", 2.mebibytes());
    let figment = rocket::Config::figment().merge(("limits", limits));

    rocket::custom(figment)
        .attach(Cors)
        .manage(server_config)
        .manage(AuthConfig::new(config.identity.jwt_secret.clone()))
        .manage(config_service)
        .manage(jobs)
        .manage(controller)
        .register(
            "/",
            catchers![bad_request, unauthorized, not_found, unprocessable, internal_error],
        )
        .mount("/", routes![index])
        .mount("/", FileServer::new(&env.static_path, Options::Missing).rank(10))
        .mount(
            "/api",
            routes![
                auth_env,
                get_config,
                put_config,
                post_config,
                load_from_reference,
                applied_jobs,
                sync_applied_jobs,
                pipeline_status,
                start_pipeline,
                stop_pipeline,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: ConfigManager, port: Option<u16>) -> Result<()> {
    let remote = match remote_store::connect(&config.remote_store).await {
        Ok(remote) => remote,
        Err(e) => {
            error!("Failed to connect remote store: {:#}", e);
            return Err(e);
        }
    };

    info!("Starting applier console API server");
    info!("Reference: {}", config.environment.reference_path.display());
    info!("Config file: {}", config.environment.config_json_path.display());
    if config.restricted {
        info!("Restricted mode: pipeline control disabled, reference files not read");
    }
    if config.identity.jwt_secret.is_none() {
        info!("No token secret configured; every caller is anonymous");
    }

    let mut rocket = build_rocket(&config, remote);
    if let Some(port) = port {
        let figment = rocket.figment().clone().merge(("port", port));
        rocket = rocket.configure(figment);
    }

    if let Err(e) = rocket.launch().await {
        error!("Rocket failed: {}", e);
        anyhow::bail!("Web server stopped: {}", e);
    }
    Ok(())
}
