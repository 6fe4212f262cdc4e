// src/core/database.rs
//! SQLite-backed store for self-hosted deployments

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

use crate::core::remote_store::RemoteStore;
use crate::core::FsOps;
use crate::types::{AppliedJob, AppliedJobRow};

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database file and run migrations
    pub async fn new(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                FsOps::ensure_dir_exists(parent).await?;
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let pool = SqlitePool::connect(&database_url).await.with_context(|| {
            format!("Failed to connect to database: {}", database_path.display())
        })?;

        info!(
            "Database connection established: {}",
            database_path.display()
        );

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_config (
                user_id TEXT PRIMARY KEY NOT NULL,
                config TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS applied_jobs (
                user_id TEXT NOT NULL,
                job_id TEXT NOT NULL,
                title TEXT,
                company TEXT,
                hr_name TEXT,
                hr_link TEXT,
                job_link TEXT,
                external_job_link TEXT,
                date_applied TEXT,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now')),
                PRIMARY KEY (user_id, job_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_applied_jobs_created ON applied_jobs(user_id, created_at);",
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations completed");
        Ok(())
    }
}

#[rocket::async_trait]
impl RemoteStore for Database {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn fetch_config(&self, user_id: &str) -> Result<Option<Value>> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT config FROM user_config WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to fetch user config")?;

        stored
            .map(|raw| serde_json::from_str(&raw).context("Stored user config is not valid JSON"))
            .transpose()
    }

    async fn upsert_config(
        &self,
        user_id: &str,
        config: &Value,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_config (user_id, config, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                config = excluded.config,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(config.to_string())
        .bind(updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to upsert user config")?;

        Ok(())
    }

    async fn applied_jobs(&self, user_id: &str) -> Result<Vec<AppliedJob>> {
        let rows = sqlx::query_as::<_, AppliedJobRow>(
            r#"
            SELECT job_id, title, company, hr_name, hr_link, job_link, external_job_link, date_applied
            FROM applied_jobs
            WHERE user_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list applied jobs")?;

        Ok(rows.into_iter().map(AppliedJob::from).collect())
    }

    async fn upsert_applied_jobs(&self, user_id: &str, rows: &[AppliedJobRow]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO applied_jobs
                    (user_id, job_id, title, company, hr_name, hr_link, job_link, external_job_link, date_applied)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(user_id, job_id) DO UPDATE SET
                    title = excluded.title,
                    company = excluded.company,
                    hr_name = excluded.hr_name,
                    hr_link = excluded.hr_link,
                    job_link = excluded.job_link,
                    external_job_link = excluded.external_job_link,
                    date_applied = excluded.date_applied
                "#,
            )
            .bind(user_id)
            .bind(row.job_key())
            .bind(&row.title)
            .bind(&row.company)
            .bind(&row.hr_name)
            .bind(&row.hr_link)
            .bind(&row.job_link)
            .bind(&row.external_job_link)
            .bind(&row.date_applied)
            .execute(&mut *tx)
            .await
            .context("Failed to upsert applied job")?;
        }

        tx.commit().await?;
        Ok(rows.len())
    }
}
