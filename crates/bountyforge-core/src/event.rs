//! Job progress events.

use serde::{Deserialize, Serialize};

use crate::id::ResourceId;
use crate::record::ParsedRecord;
use crate::stage::StageName;

/// The kind of an `Event`, matching the wire vocabulary exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Started,
    StageStarted,
    StageRaw,
    StageParsed,
    StageError,
    Finished,
    FinishedWithErrors,
    Error,
}

impl EventKind {
    /// Terminal kinds end a job's subscriber stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventKind::Finished | EventKind::FinishedWithErrors | EventKind::Error
        )
    }
}

/// A message published on a job's channel (`scan:<job-id>`). Self
/// describing: every message carries `event` and `job_id`; result
/// messages additionally carry `tool` and either `output` or `parsed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "event")]
    pub kind: EventKind,
    pub job_id: ResourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<Vec<ParsedRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Event {
    pub fn started(job_id: ResourceId) -> Self {
        Self::bare(job_id, EventKind::Started)
    }

    pub fn finished(job_id: ResourceId) -> Self {
        Self::bare(job_id, EventKind::Finished)
    }

    pub fn finished_with_errors(job_id: ResourceId) -> Self {
        Self::bare(job_id, EventKind::FinishedWithErrors)
    }

    pub fn error(job_id: ResourceId, message: impl Into<String>) -> Self {
        let mut event = Self::bare(job_id, EventKind::Error);
        event.message = Some(message.into());
        event
    }

    pub fn stage_started(job_id: ResourceId, stage: StageName) -> Self {
        let mut event = Self::bare(job_id, EventKind::StageStarted);
        event.stage = Some(stage);
        event.tool = Some(stage.binary_name().to_string());
        event
    }

    pub fn stage_raw(job_id: ResourceId, stage: StageName, output: String) -> Self {
        let mut event = Self::bare(job_id, EventKind::StageRaw);
        event.stage = Some(stage);
        event.tool = Some(stage.binary_name().to_string());
        event.output = Some(output);
        event
    }

    pub fn stage_parsed(job_id: ResourceId, stage: StageName, parsed: Vec<ParsedRecord>) -> Self {
        let mut event = Self::bare(job_id, EventKind::StageParsed);
        event.stage = Some(stage);
        event.tool = Some(stage.binary_name().to_string());
        event.parsed = Some(parsed);
        event
    }

    pub fn stage_error(job_id: ResourceId, stage: StageName, message: impl Into<String>) -> Self {
        let mut event = Self::bare(job_id, EventKind::StageError);
        event.stage = Some(stage);
        event.tool = Some(stage.binary_name().to_string());
        event.message = Some(message.into());
        event
    }

    fn bare(job_id: ResourceId, kind: EventKind) -> Self {
        Self {
            kind,
            job_id,
            stage: None,
            tool: None,
            output: None,
            parsed: None,
            message: None,
        }
    }
}
