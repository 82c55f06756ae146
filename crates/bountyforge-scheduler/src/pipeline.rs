//! The Pipeline Engine: a channel of progress events paired with a join
//! handle for the final result, driving the fixed canonical scan-stage
//! order one stage at a time.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bountyforge_adapters::registry::AdapterRegistry;
use bountyforge_core::adapter::{ToolInvocation, ToolResult};
use bountyforge_core::job::StageSpec;
use bountyforge_core::stage::StageName;
use bountyforge_core::target::Target;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::projection;

/// Progress events the engine emits while running a job's pipeline.
/// The Job Runner maps these onto `bountyforge_core::event::Event`s for
/// persistence and publishing.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    StageStarted(StageName),
    StageFinished(StageName, ToolResult),
}

/// Outcome of running a full pipeline to completion (or to an abort).
#[derive(Debug)]
pub struct PipelineRunResult {
    pub results: HashMap<StageName, ToolResult>,
    /// Set if the failure policy stopped the pipeline before every
    /// requested stage ran.
    pub aborted_after: Option<StageName>,
}

impl PipelineRunResult {
    pub fn all_succeeded(&self) -> bool {
        self.aborted_after.is_none() && self.results.values().all(|r| r.success)
    }

    pub fn any_failed(&self) -> bool {
        self.aborted_after.is_some() || self.results.values().any(|r| !r.success)
    }
}

/// Failure-handling policy for a pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub abort_on_error: bool,
}

pub struct PipelineEngine {
    registry: Arc<AdapterRegistry>,
}

impl PipelineEngine {
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self { registry }
    }

    /// Run every stage in `specs` that also appears in `requested`, in
    /// `StageName::CANONICAL_ORDER`, projecting the working target set
    /// forward after each stage. Returns a receiver of progress events
    /// alongside a join handle for the aggregated result.
    pub fn run(
        &self,
        initial_target: Target,
        requested: HashSet<StageName>,
        specs: HashMap<StageName, StageSpec>,
        config: PipelineConfig,
    ) -> (mpsc::Receiver<PipelineEvent>, tokio::task::JoinHandle<PipelineRunResult>) {
        let (tx, rx) = mpsc::channel(32);
        let registry = self.registry.clone();

        let handle = tokio::spawn(async move {
            Self::run_inner(registry, initial_target, requested, specs, config, tx).await
        });

        (rx, handle)
    }

    async fn run_inner(
        registry: Arc<AdapterRegistry>,
        initial_target: Target,
        requested: HashSet<StageName>,
        specs: HashMap<StageName, StageSpec>,
        config: PipelineConfig,
        tx: mpsc::Sender<PipelineEvent>,
    ) -> PipelineRunResult {
        let mut working_set = initial_target.hosts();
        let mut results = HashMap::new();
        let mut aborted_after = None;

        for &stage in StageName::CANONICAL_ORDER {
            if !requested.contains(&stage) {
                continue;
            }

            let Some(adapter) = registry.get(stage) else {
                warn!(%stage, "no adapter registered for requested stage, skipping");
                continue;
            };
            let Some(spec) = specs.get(&stage) else {
                warn!(%stage, "no merged spec for requested stage, skipping");
                continue;
            };

            let _ = tx.send(PipelineEvent::StageStarted(stage)).await;
            info!(%stage, targets = working_set.len(), "running stage");

            let invocation = ToolInvocation {
                target: Target::Multiple(working_set.clone()),
                scan_mode: spec.scan_mode,
                exclude: spec.exclude.clone(),
                headers: spec.headers.clone(),
                extra_argv: spec.extra_argv.clone(),
                rate_limit: spec.rate_limit,
                timeout: spec.timeout,
                wordlist: spec.wordlist.clone(),
                templates_dir: spec.templates_dir.clone(),
            };

            let result = adapter.run(invocation).await;
            let success = result.success;

            if success {
                working_set = projection::project(stage, &working_set, &result.parsed);
            }

            let _ = tx.send(PipelineEvent::StageFinished(stage, result.clone())).await;
            results.insert(stage, result);

            if !success {
                warn!(%stage, "stage failed");
                if config.abort_on_error {
                    aborted_after = Some(stage);
                    break;
                }
            }
        }

        PipelineRunResult {
            results,
            aborted_after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bountyforge_core::adapter::Adapter;
    use bountyforge_core::record::ParsedRecord;
    use bountyforge_core::scan_mode::ScanMode;
    use std::time::Duration;

    struct StubAdapter {
        stage: StageName,
        fail: bool,
    }

    #[async_trait]
    impl Adapter for StubAdapter {
        fn stage(&self) -> StageName {
            self.stage
        }

        fn supports_mode(&self, _mode: ScanMode) -> bool {
            false
        }

        async fn run(&self, invocation: ToolInvocation) -> ToolResult {
            if self.fail {
                return ToolResult::failed(self.stage, "stub failure", Some(1), String::new(), String::new());
            }
            let hosts = invocation.target.hosts();
            let parsed = hosts
                .into_iter()
                .map(|h| ParsedRecord::new("stub", h.clone()).with_field("host", h))
                .collect();
            ToolResult::ok(self.stage, String::new(), String::new(), parsed)
        }

        async fn version(&self) -> Option<String> {
            Some("1.0.0".to_string())
        }
    }

    fn stage_spec(stage: StageName) -> StageSpec {
        StageSpec {
            stage,
            scan_mode: ScanMode::Default,
            exclude: Vec::new(),
            extra_argv: Vec::new(),
            wordlist: None,
            templates_dir: None,
            rate_limit: None,
            timeout: Duration::from_secs(60),
            headers: Default::default(),
        }
    }

    #[tokio::test]
    async fn abort_on_error_stops_after_first_failure() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(StubAdapter {
            stage: StageName::SubdomainEnum,
            fail: true,
        }));
        registry.register(Arc::new(StubAdapter {
            stage: StageName::DnsBruteforce,
            fail: false,
        }));

        let engine = PipelineEngine::new(Arc::new(registry));
        let requested: HashSet<_> = [StageName::SubdomainEnum, StageName::DnsBruteforce].into_iter().collect();
        let specs = requested.iter().map(|&s| (s, stage_spec(s))).collect();

        let (_rx, handle) = engine.run(
            Target::Single("example.com".to_string()),
            requested,
            specs,
            PipelineConfig { abort_on_error: true },
        );
        let result = handle.await.unwrap();

        assert_eq!(result.aborted_after, Some(StageName::SubdomainEnum));
        assert_eq!(result.results.len(), 1);
    }

    #[tokio::test]
    async fn continues_past_failure_when_not_aborting() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(StubAdapter {
            stage: StageName::SubdomainEnum,
            fail: true,
        }));
        registry.register(Arc::new(StubAdapter {
            stage: StageName::DnsBruteforce,
            fail: false,
        }));

        let engine = PipelineEngine::new(Arc::new(registry));
        let requested: HashSet<_> = [StageName::SubdomainEnum, StageName::DnsBruteforce].into_iter().collect();
        let specs = requested.iter().map(|&s| (s, stage_spec(s))).collect();

        let (_rx, handle) = engine.run(
            Target::Single("example.com".to_string()),
            requested,
            specs,
            PipelineConfig { abort_on_error: false },
        );
        let result = handle.await.unwrap();

        assert!(result.aborted_after.is_none());
        assert_eq!(result.results.len(), 2);
        assert!(result.any_failed());
    }
}
