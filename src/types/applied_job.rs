// src/types/applied_job.rs
use serde::{Deserialize, Serialize};

/// One application performed by the bot, in the shape the front-end reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedJob {
    #[serde(rename = "Job_ID")]
    pub job_id: Option<String>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Company")]
    pub company: Option<String>,
    #[serde(rename = "HR_Name")]
    pub hr_name: Option<String>,
    #[serde(rename = "HR_Link")]
    pub hr_link: Option<String>,
    #[serde(rename = "Job_Link")]
    pub job_link: Option<String>,
    #[serde(rename = "External_Job_link")]
    pub external_job_link: Option<String>,
    #[serde(rename = "Date_Applied")]
    pub date_applied: Option<String>,
}

/// Column layout of the remote `applied_jobs` table (minus ownership columns).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AppliedJobRow {
    pub job_id: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub hr_name: Option<String>,
    pub hr_link: Option<String>,
    pub job_link: Option<String>,
    pub external_job_link: Option<String>,
    pub date_applied: Option<String>,
}

impl From<AppliedJobRow> for AppliedJob {
    fn from(row: AppliedJobRow) -> Self {
        Self {
            job_id: row.job_id,
            title: row.title,
            company: row.company,
            hr_name: row.hr_name,
            hr_link: row.hr_link,
            job_link: row.job_link,
            external_job_link: row.external_job_link,
            date_applied: row.date_applied,
        }
    }
}

impl AppliedJobRow {
    /// Row ready for upload: every field present and trimmed.
    pub fn normalized(job: &AppliedJob) -> Self {
        fn clean(value: &Option<String>) -> Option<String> {
            Some(value.as_deref().unwrap_or("").trim().to_string())
        }

        Self {
            job_id: clean(&job.job_id),
            title: clean(&job.title),
            company: clean(&job.company),
            hr_name: clean(&job.hr_name),
            hr_link: clean(&job.hr_link),
            job_link: clean(&job.job_link),
            external_job_link: clean(&job.external_job_link),
            date_applied: clean(&job.date_applied),
        }
    }

    pub fn job_key(&self) -> &str {
        self.job_id.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_with_front_end_names() {
        let job = AppliedJob {
            job_id: Some("42".to_string()),
            title: Some("Engineer".to_string()),
            ..Default::default()
        };

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["Job_ID"], json!("42"));
        assert_eq!(value["Title"], json!("Engineer"));
        assert_eq!(value["External_Job_link"], json!(null));
    }

    #[test]
    fn test_normalized_trims_and_fills_missing() {
        let job = AppliedJob {
            job_id: Some("  7 ".to_string()),
            company: Some("\tAcme\n".to_string()),
            ..Default::default()
        };

        let row = AppliedJobRow::normalized(&job);
        assert_eq!(row.job_key(), "7");
        assert_eq!(row.company.as_deref(), Some("Acme"));
        assert_eq!(row.hr_name.as_deref(), Some(""));
    }
}
