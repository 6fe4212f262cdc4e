// src/error.rs
//! Error taxonomy surfaced by the HTTP API.
//!
//! Internals work with `anyhow::Result`; handlers convert into `AppError`,
//! which decides the status code and the JSON body.

use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde_json::{json, Value};
use std::path::PathBuf;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Operation needs a verified identity
    #[error("{0}")]
    Unauthorized(String),

    /// A required local resource is missing
    #[error("{0}")]
    NotFound(String),

    /// A required external dependency is not configured
    #[error("{0}")]
    ServiceUnavailable(String),

    /// The bot is already running
    #[error("Pipeline already running")]
    AlreadyRunning { pid: u32 },

    /// Subprocesses are not allowed in this deployment
    #[error("{0}")]
    EnvironmentUnsupported(String),

    /// The bot entry script is missing
    #[error("Bot entry script not found: {}", .0.display())]
    ExecutableNotFound(PathBuf),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> Status {
        match self {
            AppError::Unauthorized(_) => Status::Unauthorized,
            AppError::NotFound(_) => Status::NotFound,
            AppError::ServiceUnavailable(_) => Status::ServiceUnavailable,
            AppError::AlreadyRunning { .. } => Status::Conflict,
            AppError::EnvironmentUnsupported(_) => Status::ServiceUnavailable,
            AppError::ExecutableNotFound(_) => Status::InternalServerError,
            AppError::Internal(_) => Status::InternalServerError,
        }
    }

    /// JSON body; only the top-level message is exposed
    pub fn body(&self) -> Value {
        match self {
            AppError::AlreadyRunning { pid } => json!({
                "error": self.to_string(),
                "running": true,
                "pid": pid,
            }),
            AppError::EnvironmentUnsupported(message) => json!({
                "error": message,
                "restricted": true,
            }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        match &self {
            AppError::Internal(e) => {
                error!("{} {} failed: {:#}", request.method(), request.uri(), e)
            }
            AppError::ExecutableNotFound(_) => {
                error!("{} {} failed: {}", request.method(), request.uri(), self)
            }
            _ => {}
        }
        (status, Json(self.body())).respond_to(request)
    }
}

pub type ApiResult<T> = Result<T, AppError>;
