//! Scan mode enumeration.
//!
//! Adapters ignore modes they do not support, falling back to `Default`
//! behavior.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    Default,
    Aggressive,
    Full,
    Recon,
    Live,
    Subdomain,
    Directory,
}

impl Default for ScanMode {
    fn default() -> Self {
        Self::Default
    }
}

impl ScanMode {
    /// Parse a scan mode, falling back to `Default` for anything
    /// unrecognized rather than erroring.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "aggressive" => Self::Aggressive,
            "full" => Self::Full,
            "recon" => Self::Recon,
            "live" => Self::Live,
            "subdomain" => Self::Subdomain,
            "directory" => Self::Directory,
            _ => Self::Default,
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Default => "default",
            Self::Aggressive => "aggressive",
            Self::Full => "full",
            Self::Recon => "recon",
            Self::Live => "live",
            Self::Subdomain => "subdomain",
            Self::Directory => "directory",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mode_falls_back_to_default() {
        assert_eq!(ScanMode::parse("quantum"), ScanMode::Default);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(ScanMode::parse("AGGRESSIVE"), ScanMode::Aggressive);
    }
}
