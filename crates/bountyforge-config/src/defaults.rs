//! Per-tool scanner defaults, loaded from a KDL document.
//!
//! A defaults file looks like:
//!
//! ```kdl
//! rate-limit 20
//!
//! subdomain_enum {
//!     additional-flags "-timeout" "30"
//! }
//! dns_bruteforce {
//!     wordlist "subdomains-small.txt"
//! }
//! http_probe {
//!     scan-mode "recon"
//! }
//! template_scan {
//!     templates-dir "./nuclei-templates"
//! }
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use bountyforge_core::job::StageOverrides;
use bountyforge_core::scan_mode::ScanMode;
use bountyforge_core::stage::StageName;
use kdl::KdlDocument;

use crate::error::ConfigResult;

/// Ambient per-tool defaults, applied wherever a job doesn't override a
/// field.
#[derive(Debug, Clone, Default)]
pub struct ScannerDefaults {
    pub rate_limit: Option<u32>,
    pub per_stage: HashMap<StageName, StageOverrides>,
}

impl ScannerDefaults {
    pub fn from_kdl(text: &str) -> ConfigResult<Self> {
        let document: KdlDocument = text.parse()?;
        let mut defaults = ScannerDefaults::default();

        if let Some(node) = document.get("rate-limit") {
            defaults.rate_limit = node
                .entries()
                .first()
                .and_then(|e| e.value().as_integer())
                .map(|v| v as u32);
        }

        for node in document.nodes() {
            let Ok(stage) = StageName::from_str(node.name().value()) else {
                continue;
            };
            let mut overrides = StageOverrides::default();
            if let Some(children) = node.children() {
                if let Some(mode_node) = children.get("scan-mode") {
                    if let Some(value) = mode_node.entries().first().and_then(|e| e.value().as_string()) {
                        overrides.scan_mode = Some(ScanMode::parse(value));
                    }
                }
                if let Some(wordlist_node) = children.get("wordlist") {
                    if let Some(value) = wordlist_node.entries().first().and_then(|e| e.value().as_string()) {
                        overrides.wordlist = Some(value.to_string());
                    }
                }
                if let Some(templates_node) = children.get("templates-dir") {
                    if let Some(value) = templates_node.entries().first().and_then(|e| e.value().as_string()) {
                        overrides.templates_dir = Some(value.to_string());
                    }
                }
                if let Some(rate_node) = children.get("rate-limit") {
                    if let Some(value) = rate_node.entries().first().and_then(|e| e.value().as_integer()) {
                        overrides.rate_limit = Some(value as u32);
                    }
                }
                if let Some(timeout_node) = children.get("timeout-secs") {
                    if let Some(value) = timeout_node.entries().first().and_then(|e| e.value().as_integer()) {
                        overrides.timeout_secs = Some(value as u64);
                    }
                }
                if let Some(flags_node) = children.get("additional-flags") {
                    let flags: Vec<String> = flags_node
                        .entries()
                        .iter()
                        .filter_map(|e| e.value().as_string().map(str::to_string))
                        .collect();
                    if !flags.is_empty() {
                        overrides.additional_flags = Some(flags);
                    }
                }
            }
            defaults.per_stage.insert(stage, overrides);
        }

        Ok(defaults)
    }

    pub fn for_stage(&self, stage: StageName) -> StageOverrides {
        self.per_stage.get(&stage).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rate_limit_and_per_stage_overrides() {
        let text = r#"
rate-limit 20

dns_bruteforce {
    wordlist "subdomains-small.txt"
}
http_probe {
    scan-mode "recon"
}
"#;
        let defaults = ScannerDefaults::from_kdl(text).unwrap();
        assert_eq!(defaults.rate_limit, Some(20));
        assert_eq!(
            defaults.for_stage(StageName::DnsBruteforce).wordlist,
            Some("subdomains-small.txt".to_string())
        );
        assert_eq!(
            defaults.for_stage(StageName::HttpProbe).scan_mode,
            Some(ScanMode::Recon)
        );
    }

    #[test]
    fn unknown_stage_node_is_ignored() {
        let text = "not_a_real_stage {\n    wordlist \"x.txt\"\n}\n";
        let defaults = ScannerDefaults::from_kdl(text).unwrap();
        assert!(defaults.per_stage.is_empty());
    }
}
