//! `subfinder` adapter — passive subdomain enumeration (`subdomain_enum`).

use async_trait::async_trait;
use bountyforge_core::adapter::{Adapter, ToolInvocation, ToolResult};
use bountyforge_core::record::ParsedRecord;
use bountyforge_core::scan_mode::ScanMode;
use bountyforge_core::stage::StageName;

use crate::json_lines;
use crate::process;

pub struct SubfinderAdapter;

impl SubfinderAdapter {
    pub fn new() -> Self {
        Self
    }

    fn build_argv(invocation: &ToolInvocation) -> Result<Vec<String>, String> {
        let target = invocation.target.prepare()?;
        let mut argv = vec![
            "-silent".to_string(),
            "-all".to_string(),
            "-recursive".to_string(),
            "-json".to_string(),
            "-disable-update-check".to_string(),
        ];
        match &invocation.target {
            bountyforge_core::target::Target::File(_) => {
                argv.push("-dL".to_string());
                argv.push(target);
            }
            _ => {
                argv.push("-d".to_string());
                argv.push(target);
            }
        }
        if let Some(exclude) = process::render_exclude(&invocation.exclude) {
            argv.push("-exclude-fields".to_string());
            argv.push(exclude);
        }
        argv.extend(invocation.extra_argv.clone());
        Ok(argv)
    }

    fn parse(output: &str) -> Vec<ParsedRecord> {
        json_lines::parse_lines("subfinder", output)
            .into_iter()
            .filter_map(|value| {
                let host = value.get("host")?.as_str()?.to_string();
                let mut record = ParsedRecord::new("subfinder", host.clone()).with_field("host", host);
                if let Some(source) = value.get("source") {
                    record = record.with_field("source", source.clone());
                }
                if let Some(input) = value.get("input") {
                    record = record.with_field("input", input.clone());
                }
                Some(record)
            })
            .collect()
    }
}

impl Default for SubfinderAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for SubfinderAdapter {
    fn stage(&self) -> StageName {
        StageName::SubdomainEnum
    }

    fn supports_mode(&self, _mode: ScanMode) -> bool {
        false
    }

    async fn run(&self, invocation: ToolInvocation) -> ToolResult {
        let argv = match Self::build_argv(&invocation) {
            Ok(argv) => argv,
            Err(e) => return ToolResult::failed(self.stage(), e, None, String::new(), String::new()),
        };

        let output = process::run("subfinder", &argv, invocation.timeout).await;
        if !output.success {
            return ToolResult::failed(
                self.stage(),
                output.error.unwrap_or_else(|| "subfinder exited with a failure status".to_string()),
                output.exit_code,
                output.stdout,
                output.stderr,
            );
        }

        let parsed = Self::parse(&output.stdout);
        ToolResult::ok(self.stage(), output.stdout, output.stderr, parsed)
    }

    async fn version(&self) -> Option<String> {
        let output = process::run("subfinder", &["-version".to_string()], std::time::Duration::from_secs(10)).await;
        if output.stdout.is_empty() && output.stderr.is_empty() {
            return None;
        }
        Some(process::parse_version(&format!("{}{}", output.stdout, output.stderr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bountyforge_core::target::Target;

    #[test]
    fn builds_domain_flag_for_single_target() {
        let invocation = ToolInvocation {
            target: Target::Single("example.com".to_string()),
            ..Default::default()
        };
        let argv = SubfinderAdapter::build_argv(&invocation).unwrap();
        assert!(argv.windows(2).any(|w| w == ["-d", "example.com"]));
    }

    #[test]
    fn parses_subfinder_json_lines() {
        let output = "{\"host\":\"api.example.com\",\"input\":\"example.com\",\"source\":[\"crtsh\"]}\n";
        let parsed = SubfinderAdapter::parse(output);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].host(), Some("api.example.com"));
    }
}
