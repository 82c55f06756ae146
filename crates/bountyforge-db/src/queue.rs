//! `PgJobQueue`: the external job queue a worker claims
//! from, using `SELECT ... FOR UPDATE SKIP LOCKED` so concurrent
//! workers never claim the same job twice.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::Row;

use bountyforge_core::id::ResourceId;
use bountyforge_core::job::JobDescriptor;
use bountyforge_core::queue::JobQueue;
use bountyforge_core::Result;

use crate::error::DbError;

pub struct PgJobQueue {
    pool: PgPool,
}

impl PgJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enqueue a job's descriptor for a worker to later claim. Callers
    /// insert the `jobs` row (via `ResultStore::enqueue_job`) first, then
    /// this one, since `scan_queue.job_id` references `jobs`.
    pub async fn push(&self, job_id: ResourceId, descriptor: &JobDescriptor) -> Result<()> {
        let value = serde_json::to_value(descriptor).map_err(DbError::from)?;

        sqlx::query(
            r#"
            INSERT INTO scan_queue (job_id, descriptor, status)
            VALUES ($1, $2, 'pending')
            "#,
        )
        .bind(job_id.as_uuid())
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(())
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn claim_next(&self, worker_id: &str) -> Result<Option<(ResourceId, JobDescriptor)>> {
        let row = sqlx::query(
            r#"
            UPDATE scan_queue
            SET status = 'claimed', claimed_by = $1, claimed_at = now()
            WHERE job_id = (
                SELECT job_id FROM scan_queue
                WHERE status = 'pending'
                ORDER BY created_at ASC
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING job_id, descriptor
            "#,
        )
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let job_id: uuid::Uuid = row.try_get("job_id").map_err(DbError::from)?;
        let descriptor: serde_json::Value = row.try_get("descriptor").map_err(DbError::from)?;
        let descriptor: JobDescriptor = serde_json::from_value(descriptor).map_err(DbError::from)?;

        Ok(Some((ResourceId::from_uuid(job_id), descriptor)))
    }
}

#[cfg(test)]
mod tests {
    // `PgJobQueue` needs a live Postgres instance; its behavior (claim
    // uses SKIP LOCKED so two workers never claim the same job) is
    // better exercised against a real pool than with a mock sqlx
    // executor, so it's left to integration testing.
}
