//! `PgResultStore`: the Result Store Gateway over a `sqlx::PgPool` — one
//! struct wrapping a cloned pool, with repository methods as inherent
//! `async fn`s plus a trait impl for the engine-facing contract.
//!
//! `jobs` holds one row per job; `job_results` holds one row per
//! `(job_id, stage_name)`, upserted so duplicate `append_result` calls
//! are idempotent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::Row;

use bountyforge_core::adapter::ToolResult;
use bountyforge_core::id::ResourceId;
use bountyforge_core::job::{JobDescriptor, JobRecord, JobStatus};
use bountyforge_core::stage::StageName;
use bountyforge_core::store::ResultStore;
use bountyforge_core::{Error, Result};

use crate::error::DbError;

pub struct PgResultStore {
    pool: PgPool,
}

impl PgResultStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn status_text(status: &JobStatus) -> (&'static str, Option<String>) {
        match status {
            JobStatus::Queued => ("queued", None),
            JobStatus::Running => ("running", None),
            JobStatus::Finished => ("finished", None),
            JobStatus::FinishedWithErrors => ("finished_with_errors", None),
            JobStatus::Error { message } => ("error", Some(message.clone())),
        }
    }

    fn status_from_row(status: &str, error_message: Option<String>) -> JobStatus {
        match status {
            "queued" => JobStatus::Queued,
            "running" => JobStatus::Running,
            "finished" => JobStatus::Finished,
            "finished_with_errors" => JobStatus::FinishedWithErrors,
            "error" => JobStatus::Error {
                message: error_message.unwrap_or_default(),
            },
            other => JobStatus::Error {
                message: format!("unrecognized status in store: {other}"),
            },
        }
    }

    async fn load_results(
        &self,
        job_id: ResourceId,
    ) -> std::result::Result<Vec<(StageName, ToolResult)>, DbError> {
        let rows = sqlx::query("SELECT stage_name, result FROM job_results WHERE job_id = $1")
            .bind(job_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let stage_name: String = row.try_get("stage_name")?;
            let stage: StageName = stage_name
                .parse()
                .map_err(|_| DbError::NotFound(format!("unrecognized stage in store: {stage_name}")))?;
            let value: serde_json::Value = row.try_get("result")?;
            let result: ToolResult = serde_json::from_value(value)?;
            results.push((stage, result));
        }
        Ok(results)
    }
}

#[async_trait]
impl ResultStore for PgResultStore {
    async fn enqueue_job(&self, job_id: ResourceId, descriptor: &JobDescriptor) -> Result<()> {
        let targets = serde_json::to_value(&descriptor.target).map_err(DbError::from)?;
        let exclude = serde_json::to_value(&descriptor.exclude).map_err(DbError::from)?;

        sqlx::query(
            r#"
            INSERT INTO jobs (job_id, initiator, targets, exclude, status)
            VALUES ($1, $2, $3, $4, 'queued')
            "#,
        )
        .bind(job_id.as_uuid())
        .bind(&descriptor.initiator)
        .bind(targets)
        .bind(exclude)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(())
    }

    async fn mark_running(&self, job_id: ResourceId) -> Result<()> {
        sqlx::query("UPDATE jobs SET status = 'running' WHERE job_id = $1")
            .bind(job_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn append_result(
        &self,
        job_id: ResourceId,
        stage: StageName,
        result: &ToolResult,
    ) -> Result<()> {
        let value = serde_json::to_value(result).map_err(DbError::from)?;

        sqlx::query(
            r#"
            INSERT INTO job_results (job_id, stage_name, result)
            VALUES ($1, $2, $3)
            ON CONFLICT (job_id, stage_name)
            DO UPDATE SET result = EXCLUDED.result, recorded_at = now()
            "#,
        )
        .bind(job_id.as_uuid())
        .bind(stage.as_str())
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(())
    }

    async fn mark_terminal(&self, job_id: ResourceId, status: JobStatus) -> Result<()> {
        let (status_text, error_message) = Self::status_text(&status);

        sqlx::query("UPDATE jobs SET status = $2, error_message = $3 WHERE job_id = $1")
            .bind(job_id.as_uuid())
            .bind(status_text)
            .bind(error_message)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn find_job(&self, job_id: ResourceId) -> Result<JobRecord> {
        let row = sqlx::query(
            "SELECT initiator, targets, exclude, enqueued_at, status, error_message FROM jobs WHERE job_id = $1",
        )
        .bind(job_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| Error::NotFound(job_id.to_string()))?;

        let initiator: String = row.try_get("initiator").map_err(DbError::from)?;
        let targets: serde_json::Value = row.try_get("targets").map_err(DbError::from)?;
        let exclude: serde_json::Value = row.try_get("exclude").map_err(DbError::from)?;
        let enqueued_at: DateTime<Utc> = row.try_get("enqueued_at").map_err(DbError::from)?;
        let status_text: String = row.try_get("status").map_err(DbError::from)?;
        let error_message: Option<String> = row.try_get("error_message").map_err(DbError::from)?;

        let targets: Vec<String> = serde_json::from_value(targets).map_err(DbError::from)?;
        let exclude: Vec<String> = serde_json::from_value(exclude).map_err(DbError::from)?;
        let status = Self::status_from_row(&status_text, error_message);

        let results = self
            .load_results(job_id)
            .await
            .map_err(Error::from)?
            .into_iter()
            .collect();

        Ok(JobRecord {
            job_id,
            initiator,
            targets,
            exclude,
            enqueued_at,
            status,
            results,
        })
    }

    async fn find_results(&self, job_id: ResourceId) -> Result<Vec<ToolResult>> {
        Ok(self
            .load_results(job_id)
            .await
            .map_err(Error::from)?
            .into_iter()
            .map(|(_, result)| result)
            .collect())
    }

    async fn list_jobs_by_principal(
        &self,
        principal: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<JobRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT job_id FROM jobs
            WHERE initiator = $1 AND ($2::timestamptz IS NULL OR enqueued_at >= $2)
            ORDER BY enqueued_at DESC
            "#,
        )
        .bind(principal)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let job_id: uuid::Uuid = row.try_get("job_id").map_err(DbError::from)?;
            records.push(self.find_job(ResourceId::from_uuid(job_id)).await?);
        }
        Ok(records)
    }

    async fn count_results(&self, job_id: ResourceId) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM job_results WHERE job_id = $1")
            .bind(job_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;
        let count: i64 = row.try_get("count").map_err(DbError::from)?;
        Ok(count as usize)
    }
}
