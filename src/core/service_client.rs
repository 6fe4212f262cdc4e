// src/core/service_client.rs
//! PostgREST client for the hosted `user_config` and `applied_jobs` tables

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::core::remote_store::RemoteStore;
use crate::types::{AppliedJob, AppliedJobRow};

const USER_CONFIG_TABLE: &str = "user_config";
const APPLIED_JOBS_TABLE: &str = "applied_jobs";
const JOB_COLUMNS: &str =
    "job_id,title,company,hr_name,hr_link,job_link,external_job_link,date_applied";
const UPSERT_PREFERENCE: &str = "resolution=merge-duplicates,return=minimal";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Deserialize)]
struct ConfigRow {
    config: Option<Value>,
}

pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl ServiceClient {
    pub fn new(base_url: String, service_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        })
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .with_context(|| format!("Failed to {}", what))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!("Remote store error on {}: {} {}", what, status, error_text);
        anyhow::bail!("Remote store returned {} on {}: {}", status, what, error_text)
    }
}

#[rocket::async_trait]
impl RemoteStore for ServiceClient {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn fetch_config(&self, user_id: &str) -> Result<Option<Value>> {
        let request = self.client.get(self.table_url(USER_CONFIG_TABLE)).query(&[
            ("select", "config".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("limit", "1".to_string()),
        ]);

        let rows: Vec<ConfigRow> = self
            .send(request, "fetch user config")
            .await?
            .json()
            .await
            .context("Failed to parse user config rows")?;

        Ok(rows.into_iter().next().and_then(|row| row.config))
    }

    async fn upsert_config(
        &self,
        user_id: &str,
        config: &Value,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let payload = json!([{
            "user_id": user_id,
            "config": config,
            "updated_at": updated_at.to_rfc3339(),
        }]);

        let request = self
            .client
            .post(self.table_url(USER_CONFIG_TABLE))
            .query(&[("on_conflict", "user_id")])
            .header("Prefer", UPSERT_PREFERENCE)
            .json(&payload);

        self.send(request, "upsert user config").await?;
        debug!("Upserted config for user {}", user_id);
        Ok(())
    }

    async fn applied_jobs(&self, user_id: &str) -> Result<Vec<AppliedJob>> {
        let request = self.client.get(self.table_url(APPLIED_JOBS_TABLE)).query(&[
            ("select", JOB_COLUMNS.to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("order", "created_at.desc".to_string()),
        ]);

        let rows: Vec<AppliedJobRow> = self
            .send(request, "list applied jobs")
            .await?
            .json()
            .await
            .context("Failed to parse applied job rows")?;

        Ok(rows.into_iter().map(AppliedJob::from).collect())
    }

    async fn upsert_applied_jobs(&self, user_id: &str, rows: &[AppliedJobRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let payload: Vec<Value> = rows
            .iter()
            .map(|row| -> Result<Value, serde_json::Error> {
                let mut record = serde_json::to_value(row)?;
                if let Some(fields) = record.as_object_mut() {
                    fields.insert("user_id".to_string(), Value::from(user_id));
                }
                Ok(record)
            })
            .collect::<Result<_, _>>()
            .context("Failed to encode applied job rows")?;

        let request = self
            .client
            .post(self.table_url(APPLIED_JOBS_TABLE))
            .query(&[("on_conflict", "user_id,job_id")])
            .header("Prefer", UPSERT_PREFERENCE)
            .json(&payload);

        self.send(request, "upsert applied jobs").await?;
        Ok(rows.len())
    }
}
