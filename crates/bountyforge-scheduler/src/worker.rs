//! A worker that claims queued jobs and drives them through the
//! `JobRunner`: claim, process, sleep-and-retry on an empty or failed
//! claim. Each worker runs exactly one job at a time; many workers run
//! concurrently against the same queue.

use std::sync::Arc;
use std::time::Duration;

use bountyforge_adapters::registry::AdapterRegistry;
use bountyforge_config::ScannerDefaults;
use bountyforge_core::bus::EventBus;
use bountyforge_core::queue::JobQueue;
use bountyforge_core::store::ResultStore;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::runner::JobRunner;

const EMPTY_QUEUE_BACKOFF: Duration = Duration::from_secs(1);
const CLAIM_ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub struct Worker<Q, S, B> {
    id: String,
    queue: Arc<Q>,
    runner: Arc<JobRunner<S, B>>,
    defaults: Arc<ScannerDefaults>,
}

impl<Q, S, B> Worker<Q, S, B>
where
    Q: JobQueue + 'static,
    S: ResultStore + 'static,
    B: EventBus + 'static,
{
    pub fn new(
        id: impl Into<String>,
        queue: Arc<Q>,
        store: Arc<S>,
        bus: Arc<B>,
        registry: Arc<AdapterRegistry>,
        defaults: Arc<ScannerDefaults>,
    ) -> Self {
        Self {
            id: id.into(),
            queue,
            runner: Arc::new(JobRunner::new(store, bus, registry)),
            defaults,
        }
    }

    /// Run the claim loop forever: one job at a time, fully drained
    /// before the next claim (sequential-within-a-job,
    /// concurrent-across-workers model — run several `Worker`s to get
    /// concurrency).
    pub async fn run(&self) {
        info!(worker_id = %self.id, "starting scan worker");

        loop {
            match self.queue.claim_next(&self.id).await {
                Ok(Some((job_id, descriptor))) => {
                    info!(%job_id, worker_id = %self.id, "claimed job");
                    if let Err(e) = self.runner.run(job_id, descriptor, &self.defaults).await {
                        error!(%job_id, error = %e, "job runner returned a pipeline-internal error");
                    }
                }
                Ok(None) => {
                    sleep(EMPTY_QUEUE_BACKOFF).await;
                }
                Err(e) => {
                    warn!(error = %e, "failed to claim next job");
                    sleep(CLAIM_ERROR_BACKOFF).await;
                }
            }
        }
    }
}
