// src/web/handlers/jobs_handlers.rs
use crate::auth::Identity;
use crate::core::AppliedJobsService;
use crate::error::ApiResult;
use crate::types::AppliedJob;
use crate::web::types::SyncResponse;

use rocket::serde::json::Json;
use rocket::State;
use tracing::debug;

pub async fn applied_jobs_handler(
    identity: Identity,
    jobs: &State<AppliedJobsService>,
) -> ApiResult<Json<Vec<AppliedJob>>> {
    let list = jobs.list(identity.user_id()).await?;
    debug!("Listed {} applied jobs", list.len());
    Ok(Json(list))
}

pub async fn sync_applied_jobs_handler(
    identity: Identity,
    jobs: &State<AppliedJobsService>,
) -> ApiResult<Json<SyncResponse>> {
    let outcome = jobs.sync(identity.user_id()).await?;
    Ok(Json(outcome.into()))
}
