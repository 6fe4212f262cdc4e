// src/core/applied_jobs.rs
//! Applied-job history: the bot's local CSV and the per-user remote table

use anyhow::{Context, Result};
use csv::StringRecord;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::core::remote_store::SharedRemoteStore;
use crate::core::FsOps;
use crate::error::AppError;
use crate::types::{AppliedJob, AppliedJobRow};

// CSV headers written by the bot
const JOB_ID: &str = "Job ID";
const TITLE: &str = "Title";
const COMPANY: &str = "Company";
const HR_NAME: &str = "HR Name";
const HR_LINK: &str = "HR Link";
const JOB_LINK: &str = "Job Link";
const EXTERNAL_JOB_LINK: &str = "External Job link";
const DATE_APPLIED: &str = "Date Applied";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub synced: usize,
    pub message: Option<String>,
}

#[derive(Clone)]
pub struct AppliedJobsService {
    csv_path: PathBuf,
    remote: Option<SharedRemoteStore>,
}

impl AppliedJobsService {
    pub fn new(csv_path: PathBuf, remote: Option<SharedRemoteStore>) -> Self {
        Self { csv_path, remote }
    }

    /// Remote rows for a signed-in user, the local CSV for anonymous callers
    pub async fn list(&self, user_id: Option<&str>) -> Result<Vec<AppliedJob>> {
        match user_id {
            Some(user_id) => match &self.remote {
                Some(remote) => remote.applied_jobs(user_id).await,
                None => Ok(Vec::new()),
            },
            None => Ok(self.read_local().await?.unwrap_or_default()),
        }
    }

    /// Copy the local CSV into the user's remote table. Upserts are keyed by
    /// `(user_id, job_id)`, so repeating a sync does not duplicate rows.
    pub async fn sync(&self, user_id: Option<&str>) -> Result<SyncOutcome, AppError> {
        let user_id = user_id.ok_or_else(|| AppError::Unauthorized("Sign in required".into()))?;
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| AppError::ServiceUnavailable("Remote store not configured".into()))?;
        let jobs = self
            .read_local()
            .await?
            .ok_or_else(|| AppError::NotFound("No applied jobs file found".into()))?;

        if jobs.is_empty() {
            return Ok(SyncOutcome {
                synced: 0,
                message: Some("CSV empty".to_string()),
            });
        }

        let rows = dedupe_by_job_id(jobs.iter().map(AppliedJobRow::normalized).collect());
        let synced = remote.upsert_applied_jobs(user_id, &rows).await?;
        info!("Synced {} applied jobs for user {}", synced, user_id);

        Ok(SyncOutcome {
            synced,
            message: None,
        })
    }

    /// `None` when the CSV does not exist
    async fn read_local(&self) -> Result<Option<Vec<AppliedJob>>> {
        let Some(content) = FsOps::read_optional(&self.csv_path).await? else {
            return Ok(None);
        };
        parse_history(&content)
            .with_context(|| format!("Failed to parse {}", self.csv_path.display()))
            .map(Some)
    }
}

/// Map CSV rows to jobs by header name. Absent columns become `None`,
/// empty cells stay empty strings.
pub fn parse_history(content: &str) -> Result<Vec<AppliedJob>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: HashMap<String, usize> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .enumerate()
        .map(|(index, name)| (name.trim_start_matches('\u{feff}').to_string(), index))
        .collect();

    let column = |record: &StringRecord, name: &str| -> Option<String> {
        headers
            .get(name)
            .and_then(|&index| record.get(index))
            .map(str::to_string)
    };

    let mut jobs = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unreadable CSV record {}: {}", line + 1, e);
                continue;
            }
        };

        jobs.push(AppliedJob {
            job_id: column(&record, JOB_ID),
            title: column(&record, TITLE),
            company: column(&record, COMPANY),
            hr_name: column(&record, HR_NAME),
            hr_link: column(&record, HR_LINK),
            job_link: column(&record, JOB_LINK),
            external_job_link: column(&record, EXTERNAL_JOB_LINK),
            date_applied: column(&record, DATE_APPLIED),
        });
    }
    Ok(jobs)
}

/// Last occurrence wins; first-seen order is kept
fn dedupe_by_job_id(rows: Vec<AppliedJobRow>) -> Vec<AppliedJobRow> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<AppliedJobRow> = Vec::with_capacity(rows.len());

    for row in rows {
        match positions.get(row.job_key()) {
            Some(&index) => unique[index] = row,
            None => {
                positions.insert(row.job_key().to_string(), unique.len());
                unique.push(row);
            }
        }
    }
    unique
}
