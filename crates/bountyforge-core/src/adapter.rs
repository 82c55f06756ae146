//! The Tool Adapter contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::record::ParsedRecord;
use crate::scan_mode::ScanMode;
use crate::stage::StageName;
use crate::target::Target;

/// Everything a single adapter invocation needs, already merged from
/// defaults + per-run overrides by the Configuration Merger.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub target: Target,
    pub scan_mode: ScanMode,
    pub exclude: Vec<String>,
    pub headers: HashMap<String, String>,
    pub extra_argv: Vec<String>,
    pub rate_limit: Option<u32>,
    pub timeout: Duration,
    pub wordlist: Option<String>,
    pub templates_dir: Option<String>,
}

impl Default for ToolInvocation {
    fn default() -> Self {
        Self {
            target: Target::Multiple(Vec::new()),
            scan_mode: ScanMode::Default,
            exclude: Vec::new(),
            headers: HashMap::new(),
            extra_argv: Vec::new(),
            rate_limit: None,
            timeout: Duration::from_secs(7200),
            wordlist: None,
            templates_dir: None,
        }
    }
}

/// The normalized outcome of one adapter invocation.
///
/// The only way to build one is through `ok`/`failed`, which keeps the
/// exit-code/error-message invariant from true by construction:
/// every successful result has exit code 0, every unsuccessful result
/// carries a non-empty error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub stage: StageName,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub raw_stdout: String,
    pub raw_stderr: String,
    pub parsed: Vec<ParsedRecord>,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(
        stage: StageName,
        raw_stdout: String,
        raw_stderr: String,
        parsed: Vec<ParsedRecord>,
    ) -> Self {
        Self {
            stage,
            success: true,
            exit_code: Some(0),
            raw_stdout,
            raw_stderr,
            parsed,
            error: None,
        }
    }

    pub fn failed(
        stage: StageName,
        error: impl Into<String>,
        exit_code: Option<i32>,
        raw_stdout: String,
        raw_stderr: String,
    ) -> Self {
        Self {
            stage,
            success: false,
            exit_code,
            raw_stdout,
            raw_stderr,
            parsed: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Per-tool wrapper: resolve the binary, build argv, spawn with a
/// timeout, capture output, parse into structured records.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Stage this adapter implements.
    fn stage(&self) -> StageName;

    /// Whether this adapter has distinct behavior for the given mode;
    /// adapters that don't recognize a mode fall back to `Default`
    /// behavior rather than erroring.
    fn supports_mode(&self, mode: ScanMode) -> bool;

    /// Run the tool once against the prepared invocation. Never returns
    /// `Err` — all failure conditions (missing binary, timeout, non-zero
    /// exit) are encoded in the returned `ToolResult`.
    async fn run(&self, invocation: ToolInvocation) -> ToolResult;

    /// Resolve a `MAJOR.MINOR[.PATCH]` version string by invoking the
    /// tool's version flag, or `None` if the binary can't be found or
    /// produces no recognizable version token.
    async fn version(&self) -> Option<String>;
}
