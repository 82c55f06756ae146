//! `httpx` adapter — the HTTP probe stage, with recon and live scan modes.

use async_trait::async_trait;
use bountyforge_core::adapter::{Adapter, ToolInvocation, ToolResult};
use bountyforge_core::record::ParsedRecord;
use bountyforge_core::scan_mode::ScanMode;
use bountyforge_core::stage::StageName;
use bountyforge_core::target::Target;

use crate::headers;
use crate::json_lines;
use crate::process;

pub struct HttpxAdapter;

impl HttpxAdapter {
    pub fn new() -> Self {
        Self
    }

    fn build_argv(invocation: &ToolInvocation) -> Result<Vec<String>, String> {
        headers::validate_headers(&invocation.headers)?;
        let target = invocation.target.prepare()?;

        let mut argv = headers::header_flags(&invocation.headers);
        argv.extend([
            "-silent".to_string(),
            "-j".to_string(),
            "-disable-update-check".to_string(),
        ]);

        match invocation.scan_mode {
            ScanMode::Recon => argv.extend(["-title".to_string(), "-status-code".to_string(), "-cdn".to_string()]),
            ScanMode::Live => argv.push("-status-code".to_string()),
            _ => argv.push("-status-code".to_string()),
        }

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

        argv.extend(invocation.extra_argv.clone());

        if let Some(exclude) = process::render_exclude(&invocation.exclude) {
            argv.push("-exclude".to_string());
            argv.push(exclude);
        }

        Ok(argv)
    }

    fn parse(output: &str) -> Vec<ParsedRecord> {
        json_lines::parse_lines("httpx", output)
            .into_iter()
            .filter_map(|value| {
                let url = value.get("url")?.as_str()?.to_string();
                let mut record = ParsedRecord::new("httpx", url.clone()).with_field("url", url);
                if let Some(status) = value.get("status_code") {
                    record = record.with_field("status", status.clone());
                }
                if let Some(title) = value.get("title") {
                    record = record.with_field("title", title.clone());
                }
                if let Some(cdn) = value.get("cdn_name") {
                    record = record.with_field("cdn", cdn.clone());
                }
                Some(record)
            })
            .collect()
    }
}

impl Default for HttpxAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for HttpxAdapter {
    fn stage(&self) -> StageName {
        StageName::HttpProbe
    }

    fn supports_mode(&self, mode: ScanMode) -> bool {
        matches!(mode, ScanMode::Recon | ScanMode::Live)
    }

    async fn run(&self, invocation: ToolInvocation) -> ToolResult {
        let argv = match Self::build_argv(&invocation) {
            Ok(argv) => argv,
            Err(e) => return ToolResult::failed(self.stage(), e, None, String::new(), String::new()),
        };

        let output = process::run("httpx", &argv, invocation.timeout).await;
        if !output.success {
            return ToolResult::failed(
                self.stage(),
                output.error.unwrap_or_else(|| "httpx exited with a failure status".to_string()),
                output.exit_code,
                output.stdout,
                output.stderr,
            );
        }

        let parsed = Self::parse(&output.stdout);
        ToolResult::ok(self.stage(), output.stdout, output.stderr, parsed)
    }

    async fn version(&self) -> Option<String> {
        let output = process::run("httpx", &["-version".to_string()], std::time::Duration::from_secs(10)).await;
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
    fn recon_mode_adds_title_and_cdn_flags() {
        let invocation = ToolInvocation {
            target: Target::Single("https://example.com".to_string()),
            scan_mode: ScanMode::Recon,
            ..Default::default()
        };
        let argv = HttpxAdapter::build_argv(&invocation).unwrap();
        assert!(argv.contains(&"-title".to_string()));
        assert!(argv.contains(&"-cdn".to_string()));
    }

    #[test]
    fn parses_httpx_json_lines() {
        let output = "{\"url\":\"https://example.com\",\"status_code\":200,\"title\":\"Example\"}\n";
        let parsed = HttpxAdapter::parse(output);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].status(), Some(200));
    }
}
