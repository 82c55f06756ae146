//! The Job Runner: drives one job's `PipelineEngine` run,
//! persisting each stage's result via the `ResultStore` before
//! publishing it via the `EventBus`.

use std::collections::HashSet;
use std::sync::Arc;

use bountyforge_adapters::registry::AdapterRegistry;
use bountyforge_config::{ConfigurationMerger, ScannerDefaults};
use bountyforge_core::bus::{job_channel, EventBus};
use bountyforge_core::event::Event;
use bountyforge_core::id::ResourceId;
use bountyforge_core::job::{JobDescriptor, JobStatus};
use bountyforge_core::store::ResultStore;
use bountyforge_core::target::Target;
use bountyforge_core::Result;
use tracing::error;

use crate::pipeline::{PipelineConfig, PipelineEngine, PipelineEvent};

pub struct JobRunner<S, B> {
    store: Arc<S>,
    bus: Arc<B>,
    registry: Arc<AdapterRegistry>,
}

impl<S, B> JobRunner<S, B>
where
    S: ResultStore + 'static,
    B: EventBus + 'static,
{
    pub fn new(store: Arc<S>, bus: Arc<B>, registry: Arc<AdapterRegistry>) -> Self {
        Self { store, bus, registry }
    }

    /// Run `descriptor` as job `job_id` to completion. The job must
    /// already exist in the store as `Queued` (step 1) —
    /// enqueueing is the API layer's job, not this one's.
    ///
    /// A pipeline-internal failure (a store write or the pipeline task
    /// itself) is not allowed to leave the job without a terminal
    /// event: every early-return path below goes through `fail_job`,
    /// which marks the job `Error` and publishes the terminal event
    /// before propagating the failure, so a subscriber blocked on the
    /// job's channel is always released.
    pub async fn run(&self, job_id: ResourceId, descriptor: JobDescriptor, defaults: &ScannerDefaults) -> Result<()> {
        let channel = job_channel(job_id);

        if let Err(e) = self.store.mark_running(job_id).await {
            return self.fail_job(job_id, &channel, e).await;
        }
        self.bus.publish(&channel, Event::started(job_id)).await;

        let requested: HashSet<_> = descriptor.tools.iter().copied().collect();
        let specs = requested
            .iter()
            .map(|&stage| {
                let overrides = descriptor.params.get(&stage).cloned().unwrap_or_default();
                let spec = ConfigurationMerger::merge(stage, defaults, &overrides, &descriptor.exclude);
                (stage, spec)
            })
            .collect();

        let initial_target = Target::Multiple(descriptor.target.clone());
        let engine = PipelineEngine::new(self.registry.clone());
        let config = PipelineConfig {
            abort_on_error: descriptor.abort_on_error,
        };

        let (mut events, handle) = engine.run(initial_target, requested, specs, config);

        while let Some(event) = events.recv().await {
            match event {
                PipelineEvent::StageStarted(stage) => {
                    self.bus.publish(&channel, Event::stage_started(job_id, stage)).await;
                }
                PipelineEvent::StageFinished(stage, result) => {
                    self.handle_stage_finished(job_id, &channel, stage, result).await;
                }
            }
        }

        let run_result = match handle.await {
            Ok(run_result) => run_result,
            Err(e) => {
                return self
                    .fail_job(job_id, &channel, bountyforge_core::Error::Internal(e.to_string()))
                    .await;
            }
        };

        // Abort-on-error stops the pipeline early, which maps to a
        // terminal status of `error`, not `finished_with_errors` (that
        // status is reserved for a pipeline that ran every requested
        // stage but had at least one unsuccessful one).
        let status = if let Some(stage) = run_result.aborted_after {
            JobStatus::Error {
                message: format!("aborted after stage {stage} failed"),
            }
        } else if run_result.all_succeeded() {
            JobStatus::Finished
        } else {
            JobStatus::FinishedWithErrors
        };

        if let Err(e) = self.store.mark_terminal(job_id, status.clone()).await {
            return self.fail_job(job_id, &channel, e).await;
        }

        let terminal_event = match &status {
            JobStatus::Finished => Event::finished(job_id),
            JobStatus::FinishedWithErrors => Event::finished_with_errors(job_id),
            JobStatus::Error { message } => Event::error(job_id, message.clone()),
            _ => unreachable!("mark_terminal only accepts terminal statuses"),
        };
        self.bus.publish(&channel, terminal_event).await;

        Ok(())
    }

    /// Mark `job_id` terminally `Error`, publish the terminal event on
    /// `channel`, and propagate `cause` to the caller. The store write
    /// is best-effort here: if it also fails, that failure is logged
    /// but the terminal event is published regardless, since the event
    /// bus is what unblocks any SSE subscriber.
    async fn fail_job(&self, job_id: ResourceId, channel: &str, cause: bountyforge_core::Error) -> Result<()> {
        error!(%job_id, error = %cause, "job runner encountered an unrecoverable internal failure");
        let message = cause.to_string();

        if let Err(e) = self
            .store
            .mark_terminal(job_id, JobStatus::Error { message: message.clone() })
            .await
        {
            error!(%job_id, error = %e, "failed to persist terminal error status after internal failure");
        }

        self.bus.publish(channel, Event::error(job_id, message)).await;
        Err(cause)
    }

    async fn handle_stage_finished(
        &self,
        job_id: ResourceId,
        channel: &str,
        stage: bountyforge_core::stage::StageName,
        result: bountyforge_core::adapter::ToolResult,
    ) {
        match self.store.append_result(job_id, stage, &result).await {
            Ok(()) => {
                if result.success {
                    self.bus
                        .publish(channel, Event::stage_raw(job_id, stage, result.raw_stdout.clone()))
                        .await;
                    self.bus
                        .publish(channel, Event::stage_parsed(job_id, stage, result.parsed.clone()))
                        .await;
                } else {
                    let message = result.error.clone().unwrap_or_else(|| "stage failed".to_string());
                    self.bus.publish(channel, Event::stage_error(job_id, stage, message)).await;
                }
            }
            Err(e) => {
                error!(%job_id, %stage, error = %e, "failed to persist stage result");
                self.bus
                    .publish(channel, Event::stage_error(job_id, stage, format!("persistence failed: {e}")))
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InMemoryEventBus;
    use async_trait::async_trait;
    use bountyforge_adapters::subfinder::SubfinderAdapter;
    use bountyforge_core::adapter::ToolResult;
    use bountyforge_core::job::JobRecord;
    use bountyforge_core::stage::StageName;
    use chrono::{DateTime, Utc};
    use futures::StreamExt;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<HashMap<ResourceId, JobRecord>>,
    }

    #[async_trait]
    impl ResultStore for MemoryStore {
        async fn enqueue_job(&self, job_id: ResourceId, descriptor: &JobDescriptor) -> Result<()> {
            self.records
                .lock()
                .unwrap()
                .insert(job_id, JobRecord::new(job_id, descriptor));
            Ok(())
        }

        async fn mark_running(&self, job_id: ResourceId) -> Result<()> {
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(&job_id)
                .ok_or_else(|| bountyforge_core::Error::NotFound(job_id.to_string()))?;
            record.status = JobStatus::Running;
            Ok(())
        }

        async fn append_result(&self, job_id: ResourceId, stage: StageName, result: &ToolResult) -> Result<()> {
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(&job_id)
                .ok_or_else(|| bountyforge_core::Error::NotFound(job_id.to_string()))?;
            record.results.insert(stage, result.clone());
            Ok(())
        }

        async fn mark_terminal(&self, job_id: ResourceId, status: JobStatus) -> Result<()> {
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(&job_id)
                .ok_or_else(|| bountyforge_core::Error::NotFound(job_id.to_string()))?;
            record.status = status;
            Ok(())
        }

        async fn find_job(&self, job_id: ResourceId) -> Result<JobRecord> {
            self.records
                .lock()
                .unwrap()
                .get(&job_id)
                .cloned()
                .ok_or_else(|| bountyforge_core::Error::NotFound(job_id.to_string()))
        }

        async fn find_results(&self, job_id: ResourceId) -> Result<Vec<ToolResult>> {
            Ok(self.find_job(job_id).await?.results.into_values().collect())
        }

        async fn list_jobs_by_principal(
            &self,
            principal: &str,
            _since: Option<DateTime<Utc>>,
        ) -> Result<Vec<JobRecord>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.initiator == principal)
                .cloned()
                .collect())
        }

        async fn count_results(&self, job_id: ResourceId) -> Result<usize> {
            Ok(self.find_job(job_id).await?.results.len())
        }
    }

    #[tokio::test]
    async fn run_persists_before_publishing_and_marks_terminal() {
        let store = Arc::new(MemoryStore::default());
        let bus = Arc::new(InMemoryEventBus::new());
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(SubfinderAdapter::new()));

        let descriptor = JobDescriptor {
            target: vec!["example.com".to_string()],
            tools: vec![StageName::SubdomainEnum],
            params: HashMap::new(),
            initiator: "alice".to_string(),
            exclude: Vec::new(),
            abort_on_error: false,
        };
        let job_id = ResourceId::new();
        store.enqueue_job(job_id, &descriptor).await.unwrap();

        let runner = JobRunner::new(store.clone(), bus.clone(), Arc::new(registry));
        let defaults = ScannerDefaults::default();

        let channel = job_channel(job_id);
        let mut subscriber = bus.subscribe(&channel).await;

        runner.run(job_id, descriptor, &defaults).await.unwrap();

        let record = store.find_job(job_id).await.unwrap();
        assert!(record.status.is_terminal());

        let mut saw_finished = false;
        while let Some(event) = subscriber.next().await {
            if event.kind.is_terminal() {
                saw_finished = true;
                break;
            }
        }
        assert!(saw_finished);
    }

    struct FailingAdapter(StageName);

    #[async_trait]
    impl Adapter for FailingAdapter {
        fn stage(&self) -> StageName {
            self.0
        }

        fn supports_mode(&self, _mode: bountyforge_core::scan_mode::ScanMode) -> bool {
            false
        }

        async fn run(&self, _invocation: bountyforge_core::adapter::ToolInvocation) -> ToolResult {
            ToolResult::failed(self.0, "binary missing", None, String::new(), String::new())
        }

        async fn version(&self) -> Option<String> {
            None
        }
    }

    #[tokio::test]
    async fn abort_on_error_marks_job_terminal_status_error() {
        use bountyforge_core::adapter::Adapter;

        let store = Arc::new(MemoryStore::default());
        let bus = Arc::new(InMemoryEventBus::new());
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(FailingAdapter(StageName::SubdomainEnum)));

        let descriptor = JobDescriptor {
            target: vec!["example.com".to_string()],
            tools: vec![StageName::SubdomainEnum],
            params: HashMap::new(),
            initiator: "alice".to_string(),
            exclude: Vec::new(),
            abort_on_error: true,
        };
        let job_id = ResourceId::new();
        store.enqueue_job(job_id, &descriptor).await.unwrap();

        let runner = JobRunner::new(store.clone(), bus.clone(), Arc::new(registry));
        let defaults = ScannerDefaults::default();

        runner.run(job_id, descriptor, &defaults).await.unwrap();

        let record = store.find_job(job_id).await.unwrap();
        assert!(matches!(record.status, JobStatus::Error { .. }));
    }

    #[tokio::test]
    async fn internal_store_failure_still_emits_a_terminal_event() {
        // `mark_running` fails because the job was never enqueued in
        // the store, simulating a persistence-layer internal failure.
        let store = Arc::new(MemoryStore::default());
        let bus = Arc::new(InMemoryEventBus::new());
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(SubfinderAdapter::new()));

        let descriptor = JobDescriptor {
            target: vec!["example.com".to_string()],
            tools: vec![StageName::SubdomainEnum],
            params: HashMap::new(),
            initiator: "alice".to_string(),
            exclude: Vec::new(),
            abort_on_error: false,
        };
        let job_id = ResourceId::new();

        let runner = JobRunner::new(store.clone(), bus.clone(), Arc::new(registry));
        let defaults = ScannerDefaults::default();

        let channel = job_channel(job_id);
        let mut subscriber = bus.subscribe(&channel).await;

        let result = runner.run(job_id, descriptor, &defaults).await;
        assert!(result.is_err());

        let event = subscriber.next().await.expect("a terminal event must still be published");
        assert_eq!(event.kind, bountyforge_core::event::EventKind::Error);
        assert!(subscriber.next().await.is_none());
    }
}
