//! `nmap` adapter — the port-scan stage. Supports the full scan-mode
//! table (not just a single `-A` toggle) and parses greppable
//! (`-oG -`) output so results can be read without an XML dependency.

use async_trait::async_trait;
use bountyforge_core::adapter::{Adapter, ToolInvocation, ToolResult};
use bountyforge_core::record::ParsedRecord;
use bountyforge_core::scan_mode::ScanMode;
use bountyforge_core::stage::StageName;
use bountyforge_core::target::Target;

use crate::process;

pub struct NmapAdapter;

impl NmapAdapter {
    pub fn new() -> Self {
        Self
    }

    fn build_argv(invocation: &ToolInvocation) -> Result<Vec<String>, String> {
        let mut argv = vec!["-Pn".to_string()];

        match invocation.scan_mode {
            ScanMode::Aggressive => argv.push("-A".to_string()),
            ScanMode::Full => argv.push("-p-".to_string()),
            _ => {
                argv.push("-T4".to_string());
                argv.push("-sV".to_string());
            }
        }

        match &invocation.target {
            Target::File(path) => {
                invocation.target.prepare()?;
                argv.push("-iL".to_string());
                argv.push(path.display().to_string());
            }
            _ => {
                let hosts = invocation.target.hosts();
                if hosts.is_empty() || hosts.iter().all(|h| h.is_empty()) {
                    return Err("no valid targets provided".to_string());
                }
                argv.extend(hosts);
            }
        }

        argv.extend(invocation.extra_argv.clone());
        argv.push("-oG".to_string());
        argv.push("-".to_string());
        Ok(argv)
    }

    /// Parse nmap's greppable (`-oG -`) output into one record per open
    /// port, carrying the scanned host and the `port/protocol` pair.
    fn parse(output: &str) -> Vec<ParsedRecord> {
        let mut records = Vec::new();
        for line in output.lines() {
            let Some(ports_idx) = line.find("Ports:") else {
                continue;
            };
            let Some(host_field) = line.strip_prefix("Host: ") else {
                continue;
            };
            let host = host_field
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
            if host.is_empty() {
                continue;
            }
            let ports_section = &line[ports_idx + "Ports:".len()..];
            let ports_section = ports_section
                .split("Ignored State:")
                .next()
                .unwrap_or(ports_section);

            for entry in ports_section.split(',') {
                let fields: Vec<&str> = entry.trim().split('/').collect();
                if fields.len() < 3 {
                    continue;
                }
                let (port, state, proto) = (fields[0], fields[1], fields[2]);
                if state != "open" {
                    continue;
                }
                records.push(
                    ParsedRecord::new("nmap", host.clone())
                        .with_field("host", host.clone())
                        .with_field("port", format!("{port}/{proto}")),
                );
            }
        }
        records
    }
}

impl Default for NmapAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for NmapAdapter {
    fn stage(&self) -> StageName {
        StageName::PortScan
    }

    fn supports_mode(&self, mode: ScanMode) -> bool {
        matches!(mode, ScanMode::Aggressive | ScanMode::Full)
    }

    async fn run(&self, invocation: ToolInvocation) -> ToolResult {
        let argv = match Self::build_argv(&invocation) {
            Ok(argv) => argv,
            Err(e) => return ToolResult::failed(self.stage(), e, None, String::new(), String::new()),
        };

        let output = process::run("nmap", &argv, invocation.timeout).await;
        if !output.success {
            return ToolResult::failed(
                self.stage(),
                output.error.unwrap_or_else(|| "nmap exited with a failure status".to_string()),
                output.exit_code,
                output.stdout,
                output.stderr,
            );
        }

        let parsed = Self::parse(&output.stdout);
        ToolResult::ok(self.stage(), output.stdout, output.stderr, parsed)
    }

    async fn version(&self) -> Option<String> {
        let output = process::run("nmap", &["-V".to_string()], std::time::Duration::from_secs(10)).await;
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
    fn aggressive_mode_adds_dash_a() {
        let invocation = ToolInvocation {
            target: Target::Single("10.0.0.1".to_string()),
            scan_mode: ScanMode::Aggressive,
            ..Default::default()
        };
        let argv = NmapAdapter::build_argv(&invocation).unwrap();
        assert!(argv.contains(&"-A".to_string()));
    }

    #[test]
    fn parses_open_ports_from_greppable_output() {
        let line = "Host: 10.0.0.1 (example.com)\tPorts: 80/open/tcp//http///, 443/closed/tcp//https///\tIgnored State: filtered (997)\n";
        let records = NmapAdapter::parse(line);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].port(), Some("80/tcp"));
    }
}
