//! Result Store Gateway contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::adapter::ToolResult;
use crate::id::ResourceId;
use crate::job::{JobDescriptor, JobRecord, JobStatus};
use crate::stage::StageName;
use crate::Result;

/// Persistence contract for job metadata and per-job results.
///
/// Implementations may or may not be atomic across calls; callers never
/// rely on cross-call atomicity, and `append_result` must be idempotent
/// by `(job_id, stage)` so duplicate appends are harmless.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn enqueue_job(&self, job_id: ResourceId, descriptor: &JobDescriptor) -> Result<()>;

    async fn mark_running(&self, job_id: ResourceId) -> Result<()>;

    async fn append_result(
        &self,
        job_id: ResourceId,
        stage: StageName,
        result: &ToolResult,
    ) -> Result<()>;

    async fn mark_terminal(&self, job_id: ResourceId, status: JobStatus) -> Result<()>;

    async fn find_job(&self, job_id: ResourceId) -> Result<JobRecord>;

    async fn find_results(&self, job_id: ResourceId) -> Result<Vec<ToolResult>>;

    async fn list_jobs_by_principal(
        &self,
        principal: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<JobRecord>>;

    async fn count_results(&self, job_id: ResourceId) -> Result<usize>;
}
