//! Canonical pipeline stages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of stages the pipeline engine knows how to run. Stages
/// absent from a job's requested set are skipped in place; present stages
/// always execute in `StageName::CANONICAL_ORDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    SubdomainEnum,
    DnsBruteforce,
    PortScan,
    HttpProbe,
    DirectoryBruteforce,
    TemplateScan,
}

impl StageName {
    /// Canonical execution order.
    pub const CANONICAL_ORDER: &'static [StageName] = &[
        StageName::SubdomainEnum,
        StageName::DnsBruteforce,
        StageName::PortScan,
        StageName::HttpProbe,
        StageName::DirectoryBruteforce,
        StageName::TemplateScan,
    ];

    /// The binary name the adapter for this stage resolves on PATH.
    pub fn binary_name(&self) -> &'static str {
        match self {
            StageName::SubdomainEnum => "subfinder",
            StageName::DnsBruteforce => "ffuf",
            StageName::PortScan => "nmap",
            StageName::HttpProbe => "httpx",
            StageName::DirectoryBruteforce => "ffuf",
            StageName::TemplateScan => "nuclei",
        }
    }

    /// Whether this is the pipeline's terminal stage (no further
    /// projection is applied after it runs).
    pub fn is_terminal(&self) -> bool {
        matches!(self, StageName::TemplateScan)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::SubdomainEnum => "subdomain_enum",
            StageName::DnsBruteforce => "dns_bruteforce",
            StageName::PortScan => "port_scan",
            StageName::HttpProbe => "http_probe",
            StageName::DirectoryBruteforce => "directory_bruteforce",
            StageName::TemplateScan => "template_scan",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized stage name: {0}")]
pub struct ParseStageNameError(String);

impl FromStr for StageName {
    type Err = ParseStageNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "subdomain_enum" | "subfinder" => Ok(StageName::SubdomainEnum),
            "dns_bruteforce" | "subdomain_bruteforce" => Ok(StageName::DnsBruteforce),
            "port_scan" | "nmap" => Ok(StageName::PortScan),
            "http_probe" | "httpx" => Ok(StageName::HttpProbe),
            "directory_bruteforce" | "ffuf" => Ok(StageName::DirectoryBruteforce),
            "template_scan" | "nuclei" => Ok(StageName::TemplateScan),
            other => Err(ParseStageNameError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_matches_spec() {
        assert_eq!(
            StageName::CANONICAL_ORDER,
            &[
                StageName::SubdomainEnum,
                StageName::DnsBruteforce,
                StageName::PortScan,
                StageName::HttpProbe,
                StageName::DirectoryBruteforce,
                StageName::TemplateScan,
            ]
        );
    }

    #[test]
    fn parse_is_case_and_alias_insensitive() {
        assert_eq!(
            "subfinder".parse::<StageName>().unwrap(),
            StageName::SubdomainEnum
        );
        assert_eq!(
            "Port-Scan".parse::<StageName>().unwrap(),
            StageName::PortScan
        );
    }

    #[test]
    fn only_template_scan_is_terminal() {
        for stage in StageName::CANONICAL_ORDER {
            assert_eq!(stage.is_terminal(), *stage == StageName::TemplateScan);
        }
    }
}
