//! `ffuf` adapter — backs both the DNS brute-force and directory
//! brute-force stages, switching between `Host: FUZZ.<host>`
//! and `/FUZZ` modes, fanning out one invocation per host.

use async_trait::async_trait;
use bountyforge_core::adapter::{Adapter, ToolInvocation, ToolResult};
use bountyforge_core::record::ParsedRecord;
use bountyforge_core::scan_mode::ScanMode;
use bountyforge_core::stage::StageName;

use crate::json_lines;
use crate::process;

const DEFAULT_WORDLIST: &str = "./wordlists/web-content/common.txt";

#[derive(Clone, Copy, PartialEq, Eq)]
enum FuzzMode {
    Subdomain,
    Directory,
}

fn split_scheme_host(target: &str, fallback_scheme: &str) -> (String, String) {
    match target.split_once("://") {
        Some((scheme, rest)) => (scheme.to_string(), rest.to_string()),
        None => (fallback_scheme.to_string(), target.to_string()),
    }
}

fn build_argv(mode: FuzzMode, host: &str, invocation: &ToolInvocation) -> Vec<String> {
    let (scheme, bare_host) = split_scheme_host(host, "http");
    let wordlist = invocation
        .wordlist
        .clone()
        .unwrap_or_else(|| DEFAULT_WORDLIST.to_string());

    let mut argv = vec![
        "-w".to_string(),
        wordlist,
        "-of".to_string(),
        "json".to_string(),
        "-json".to_string(),
        "-s".to_string(),
    ];

    match mode {
        FuzzMode::Subdomain => {
            argv.push("-u".to_string());
            argv.push(format!("{scheme}://{bare_host}"));
            argv.push("-H".to_string());
            argv.push(format!("Host: FUZZ.{bare_host}"));
        }
        FuzzMode::Directory => {
            argv.push("-u".to_string());
            argv.push(format!("{scheme}://{bare_host}/FUZZ"));
            argv.push("-recursion".to_string());
            argv.push("-recursion-depth".to_string());
            argv.push("2".to_string());
        }
    }

    if let Some(rate) = invocation.rate_limit {
        argv.push("-rate".to_string());
        argv.push(rate.to_string());
    }

    argv.push("-r".to_string());
    argv.extend(invocation.extra_argv.clone());
    argv
}

fn parse_host_output(mode: FuzzMode, host: &str, output: &str) -> Vec<ParsedRecord> {
    let (_, bare_host) = split_scheme_host(host, "http");
    json_lines::parse_lines("ffuf", output)
        .into_iter()
        .filter_map(|value| {
            let url = value.get("url")?.as_str()?.to_string();
            let mut record = ParsedRecord::new("ffuf", host).with_field("url", url);
            if mode == FuzzMode::Subdomain {
                // ffuf's `-json` output reports the matched word under
                // `input.FUZZ`; the discovered subdomain is that word
                // substituted back into the `FUZZ.<host>` template.
                let word = value
                    .get("input")
                    .and_then(|i| i.get("FUZZ"))
                    .and_then(|v| v.as_str());
                if let Some(word) = word {
                    record = record.with_field("host", format!("{word}.{bare_host}"));
                }
            }
            if let Some(status) = value.get("status") {
                record = record.with_field("status", status.clone());
            }
            if let Some(length) = value.get("length") {
                record = record.with_field("length", length.clone());
            }
            Some(record)
        })
        .collect()
}

/// Fan out one ffuf invocation per host in the target set, aggregating
/// every host's outcome into a single `ToolResult`. A host whose own
/// invocation fails does not abort the others; the aggregate only fails
/// if every host failed.
async fn run_fanned_out(stage: StageName, mode: FuzzMode, invocation: ToolInvocation) -> ToolResult {
    let hosts = invocation.target.hosts();
    if hosts.is_empty() {
        return ToolResult::failed(
            stage,
            "ffuf requires an explicit host list, not a target file".to_string(),
            None,
            String::new(),
            String::new(),
        );
    }

    let mut raw_stdout = String::new();
    let mut raw_stderr = String::new();
    let mut parsed = Vec::new();
    let mut failures = Vec::new();
    let mut any_success = false;

    for host in &hosts {
        let argv = build_argv(mode, host, &invocation);
        let output = process::run("ffuf", &argv, invocation.timeout).await;

        raw_stdout.push_str(&format!("# {host}\n{}\n", output.stdout));
        raw_stderr.push_str(&format!("# {host}\n{}\n", output.stderr));

        if output.success {
            any_success = true;
            parsed.extend(parse_host_output(mode, host, &output.stdout));
        } else {
            failures.push(format!(
                "{host}: {}",
                output.error.unwrap_or_else(|| "ffuf exited with a failure status".to_string())
            ));
        }
    }

    if !any_success {
        return ToolResult::failed(stage, failures.join("; "), None, raw_stdout, raw_stderr);
    }

    ToolResult::ok(stage, raw_stdout, raw_stderr, parsed)
}

pub struct FuzzerSubdomainAdapter;

impl FuzzerSubdomainAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FuzzerSubdomainAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for FuzzerSubdomainAdapter {
    fn stage(&self) -> StageName {
        StageName::DnsBruteforce
    }

    fn supports_mode(&self, mode: ScanMode) -> bool {
        matches!(mode, ScanMode::Subdomain)
    }

    async fn run(&self, invocation: ToolInvocation) -> ToolResult {
        run_fanned_out(self.stage(), FuzzMode::Subdomain, invocation).await
    }

    async fn version(&self) -> Option<String> {
        ffuf_version().await
    }
}

pub struct FuzzerDirectoryAdapter;

impl FuzzerDirectoryAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FuzzerDirectoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for FuzzerDirectoryAdapter {
    fn stage(&self) -> StageName {
        StageName::DirectoryBruteforce
    }

    fn supports_mode(&self, mode: ScanMode) -> bool {
        matches!(mode, ScanMode::Directory)
    }

    async fn run(&self, invocation: ToolInvocation) -> ToolResult {
        run_fanned_out(self.stage(), FuzzMode::Directory, invocation).await
    }

    async fn version(&self) -> Option<String> {
        ffuf_version().await
    }
}

async fn ffuf_version() -> Option<String> {
    let output = process::run("ffuf", &["-V".to_string()], std::time::Duration::from_secs(20)).await;
    if output.stdout.is_empty() && output.stderr.is_empty() {
        return None;
    }
    Some(process::parse_version(&format!("{}{}", output.stdout, output.stderr)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bountyforge_core::target::Target;

    #[test]
    fn builds_host_header_for_subdomain_mode() {
        let invocation = ToolInvocation {
            target: Target::Single("example.com".to_string()),
            ..Default::default()
        };
        let argv = build_argv(FuzzMode::Subdomain, "example.com", &invocation);
        assert!(argv.windows(2).any(|w| w == ["-H", "Host: FUZZ.example.com"]));
    }

    #[test]
    fn builds_fuzz_path_for_directory_mode() {
        let invocation = ToolInvocation::default();
        let argv = build_argv(FuzzMode::Directory, "https://example.com", &invocation);
        assert!(argv.iter().any(|a| a == "https://example.com/FUZZ"));
    }

    #[test]
    fn parses_ffuf_json_lines() {
        let parsed = parse_host_output(
            FuzzMode::Directory,
            "example.com",
            "{\"url\":\"https://example.com/admin\",\"status\":200,\"length\":10}\n",
        );
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].status(), Some(200));
    }

    #[test]
    fn subdomain_mode_derives_host_from_fuzz_keyword() {
        let parsed = parse_host_output(
            FuzzMode::Subdomain,
            "example.com",
            "{\"url\":\"http://example.com\",\"status\":200,\"input\":{\"FUZZ\":\"api\"}}\n",
        );
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].host(), Some("api.example.com"));
    }
}
