//! Shared subprocess execution for all tool adapters (steps
//! 2-5): resolve the binary on PATH, spawn with piped stdout/stderr, and
//! enforce a wall-clock timeout.

use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Raw outcome of running one subprocess to completion (or not).
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Set when the process did not complete successfully; `None` for a
    /// `success == true` output (invariant).
    pub error: Option<String>,
}

impl ProcessOutput {
    fn binary_missing(binary: &str) -> Self {
        Self {
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            error: Some(format!("binary missing: {binary} not found on PATH")),
        }
    }

    fn timeout(timeout: Duration) -> Self {
        Self {
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            error: Some(format!("timeout ({:.0}s) expired", timeout.as_secs_f64())),
        }
    }

    fn spawn_failed(err: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            error: Some(format!("failed to spawn process: {err}")),
        }
    }
}

/// Resolve a binary name to an absolute path on PATH, or `None` if it
/// isn't installed.
pub fn resolve_binary(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Spawn `binary` with `argv`, wait up to `timeout`, and capture
/// stdout/stderr. Kills the child and returns a timeout outcome if it
/// doesn't finish in time.
pub async fn run(binary: &str, argv: &[String], timeout: Duration) -> ProcessOutput {
    let Some(path) = resolve_binary(binary) else {
        return ProcessOutput::binary_missing(binary);
    };

    let mut command = Command::new(path);
    command
        .args(argv)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => return ProcessOutput::spawn_failed(e),
    };

    let mut stdout_pipe = child.stdout.take().expect("stdout was piped");
    let mut stderr_pipe = child.stderr.take().expect("stderr was piped");

    let stdout_task = tokio::spawn(async move {
        let mut buf = String::new();
        let _ = stdout_pipe.read_to_string(&mut buf).await;
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        let _ = stderr_pipe.read_to_string(&mut buf).await;
        buf
    });

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => {
            let stdout = stdout_task.await.unwrap_or_default();
            let stderr = stderr_task.await.unwrap_or_default();
            ProcessOutput {
                success: status.success(),
                exit_code: status.code(),
                stdout,
                stderr,
                error: None,
            }
        }
        Ok(Err(e)) => ProcessOutput::spawn_failed(e),
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            ProcessOutput::timeout(timeout)
        }
    }
}

/// Extract a `MAJOR.MINOR[.PATCH]` token from version-flag output,
/// falling back to `"unknown"` if nothing matches.
pub fn parse_version(output: &str) -> String {
    static VERSION_RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let re = VERSION_RE.get_or_init(|| regex::Regex::new(r"\d+\.\d+(\.\d+)?(-\w+)?").unwrap());
    re.find(output)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Render an exclude list as the comma-joined value tools expect.
pub fn render_exclude(exclude: &[String]) -> Option<String> {
    if exclude.is_empty() {
        None
    } else {
        Some(exclude.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_version_extracts_semver() {
        assert_eq!(parse_version("subfinder version v2.3.4"), "2.3.4");
        assert_eq!(parse_version("ffuf version 2.1.0-dev"), "2.1.0-dev");
        assert_eq!(parse_version("version 1.0"), "1.0");
    }

    #[test]
    fn parse_version_falls_back_to_unknown() {
        assert_eq!(parse_version("garbage, no version here"), "unknown");
    }

    #[test]
    fn render_exclude_none_when_empty() {
        assert_eq!(render_exclude(&[]), None);
        assert_eq!(
            render_exclude(&["a.com".to_string(), "b.com".to_string()]),
            Some("a.com,b.com".to_string())
        );
    }

    #[tokio::test]
    async fn missing_binary_reports_error() {
        let out = run("definitely-not-a-real-binary", &[], Duration::from_secs(1)).await;
        assert!(!out.success);
        assert!(out.error.unwrap().contains("not found"));
    }
}
