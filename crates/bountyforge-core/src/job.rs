//! Job descriptors, stage specs, and job records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::adapter::ToolResult;
use crate::id::ResourceId;
use crate::scan_mode::ScanMode;
use crate::stage::StageName;

/// Per-stage option overrides supplied in a `JobDescriptor.params` entry.
/// Only fields explicitly set here replace the corresponding default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageOverrides {
    pub scan_mode: Option<ScanMode>,
    pub additional_flags: Option<Vec<String>>,
    pub wordlist: Option<String>,
    pub templates_dir: Option<String>,
    pub rate_limit: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

/// A job descriptor as delivered by the external API/queue.
/// The engine is handed a `job_id` separately at enqueue time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub target: Vec<String>,
    pub tools: Vec<StageName>,
    #[serde(default)]
    pub params: HashMap<StageName, StageOverrides>,
    pub initiator: String,
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Abort the remaining pipeline as soon as one stage fails.
    #[serde(default)]
    pub abort_on_error: bool,
}

/// The fully-merged, per-stage configuration the Pipeline Engine hands to
/// an adapter.
#[derive(Debug, Clone)]
pub struct StageSpec {
    pub stage: StageName,
    pub scan_mode: ScanMode,
    pub exclude: Vec<String>,
    pub extra_argv: Vec<String>,
    pub wordlist: Option<String>,
    pub templates_dir: Option<String>,
    pub rate_limit: Option<u32>,
    pub timeout: Duration,
    pub headers: HashMap<String, String>,
}

/// Terminal/non-terminal job status (exact vocabulary).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Finished,
    FinishedWithErrors,
    Error { message: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Finished | JobStatus::FinishedWithErrors | JobStatus::Error { .. }
        )
    }
}

/// Durable record of a job's lifecycle and per-stage results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: ResourceId,
    pub initiator: String,
    pub targets: Vec<String>,
    pub exclude: Vec<String>,
    pub enqueued_at: DateTime<Utc>,
    pub status: JobStatus,
    pub results: HashMap<StageName, ToolResult>,
}

impl JobRecord {
    pub fn new(job_id: ResourceId, descriptor: &JobDescriptor) -> Self {
        Self {
            job_id,
            initiator: descriptor.initiator.clone(),
            targets: descriptor.target.clone(),
            exclude: descriptor.exclude.clone(),
            enqueued_at: Utc::now(),
            status: JobStatus::Queued,
            results: HashMap::new(),
        }
    }

    /// Aggregate count of parsed records across every recorded stage.
    pub fn result_count(&self) -> usize {
        self.results.values().map(|r| r.parsed.len()).sum()
    }
}
