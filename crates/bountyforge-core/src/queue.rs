//! External job queue contract: a worker claims the next
//! pending job and runs it to completion.

use async_trait::async_trait;

use crate::id::ResourceId;
use crate::job::JobDescriptor;
use crate::Result;

/// Supplies the next queued job to a worker, claiming it so no other
/// worker picks up the same job concurrently.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn claim_next(&self, worker_id: &str) -> Result<Option<(ResourceId, JobDescriptor)>>;
}
