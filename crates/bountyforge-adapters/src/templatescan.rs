//! `nuclei` adapter — the terminal template-scan stage (`template_scan`),
//! including `update_templates`/`update_nuclei` maintenance commands.

use async_trait::async_trait;
use bountyforge_core::adapter::{Adapter, ToolInvocation, ToolResult};
use bountyforge_core::record::ParsedRecord;
use bountyforge_core::scan_mode::ScanMode;
use bountyforge_core::stage::StageName;
use bountyforge_core::target::Target;

use crate::json_lines;
use crate::process;

const DEFAULT_RATE_LIMIT: u32 = 20;

pub struct NucleiAdapter;

impl NucleiAdapter {
    pub fn new() -> Self {
        Self
    }

    fn build_argv(invocation: &ToolInvocation) -> Result<Vec<String>, String> {
        let target = invocation.target.prepare()?;

        let mut argv = vec![
            "-silent".to_string(),
            "-j".to_string(),
            "-disable-update-check".to_string(),
            "-fr".to_string(),
        ];

        match &invocation.target {
            Target::File(_) => {
                argv.push("-l".to_string());
                argv.push(target);
            }
            _ => {
                argv.push("-u".to_string());
                argv.push(target);
            }
        }

        if let Some(dir) = &invocation.templates_dir {
            argv.push("-t".to_string());
            argv.push(dir.clone());
        }

        argv.extend(invocation.extra_argv.clone());

        if let Some(exclude) = process::render_exclude(&invocation.exclude) {
            argv.push("-exclude-hosts".to_string());
            argv.push(exclude);
        }

        argv.push("-rate-limit".to_string());
        argv.push(invocation.rate_limit.unwrap_or(DEFAULT_RATE_LIMIT).to_string());

        Ok(argv)
    }

    fn parse(output: &str) -> Vec<ParsedRecord> {
        json_lines::parse_lines("nuclei", output)
            .into_iter()
            .filter_map(|value| {
                let matched_at = value
                    .get("matched-at")
                    .or_else(|| value.get("host"))
                    .and_then(|v| v.as_str())?
                    .to_string();
                let mut record =
                    ParsedRecord::new("nuclei", matched_at.clone()).with_field("matched_at", matched_at);
                if let Some(severity) = value.pointer("/info/severity") {
                    record = record.with_field("severity", severity.clone());
                }
                if let Some(template_id) = value.get("template-id") {
                    record = record.with_field("template_id", template_id.clone());
                }
                if let Some(name) = value.pointer("/info/name") {
                    record = record.with_field("name", name.clone());
                }
                Some(record)
            })
            .collect()
    }

    /// Run `nuclei -update-templates` (maintenance hook,
    /// original source's `NucleiModule.update_templates`).
    pub async fn update_templates(&self) -> Result<String, String> {
        let output = process::run(
            "nuclei",
            &["-update-templates".to_string()],
            std::time::Duration::from_secs(120),
        )
        .await;
        if output.success {
            Ok(process::parse_version(&format!("{}{}", output.stdout, output.stderr)))
        } else {
            Err(output.error.unwrap_or_else(|| "template update failed".to_string()))
        }
    }
}

impl Default for NucleiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for NucleiAdapter {
    fn stage(&self) -> StageName {
        StageName::TemplateScan
    }

    fn supports_mode(&self, _mode: ScanMode) -> bool {
        false
    }

    async fn run(&self, invocation: ToolInvocation) -> ToolResult {
        let argv = match Self::build_argv(&invocation) {
            Ok(argv) => argv,
            Err(e) => return ToolResult::failed(self.stage(), e, None, String::new(), String::new()),
        };

        let output = process::run("nuclei", &argv, invocation.timeout).await;
        if !output.success {
            return ToolResult::failed(
                self.stage(),
                output.error.unwrap_or_else(|| "nuclei exited with a failure status".to_string()),
                output.exit_code,
                output.stdout,
                output.stderr,
            );
        }

        let parsed = Self::parse(&output.stdout);
        ToolResult::ok(self.stage(), output.stdout, output.stderr, parsed)
    }

    async fn version(&self) -> Option<String> {
        let output = process::run("nuclei", &["-version".to_string()], std::time::Duration::from_secs(10)).await;
        if output.stdout.is_empty() && output.stderr.is_empty() {
            return None;
        }
        Some(process::parse_version(&format!("{}{}", output.stdout, output.stderr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rate_limit_applied_when_unset() {
        let invocation = ToolInvocation {
            target: Target::Single("https://example.com".to_string()),
            ..Default::default()
        };
        let argv = NucleiAdapter::build_argv(&invocation).unwrap();
        assert!(argv.windows(2).any(|w| w == ["-rate-limit", "20"]));
    }

    #[test]
    fn parses_nuclei_json_lines() {
        let output = "{\"matched-at\":\"https://example.com/\",\"template-id\":\"exposed-panel\",\"info\":{\"severity\":\"medium\",\"name\":\"Exposed Panel\"}}\n";
        let parsed = NucleiAdapter::parse(output);
        assert_eq!(parsed.len(), 1);
        assert_eq!(
            parsed[0].fields.get("severity").and_then(|v| v.as_str()),
            Some("medium")
        );
    }
}
