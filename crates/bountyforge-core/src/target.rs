//! Target specifications fed into a tool adapter.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a target set is shaped for an adapter invocation.
///
/// Between pipeline stages the working target set is always carried as
/// `Multiple` — `Single` exists only as a convenience at the API boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Target {
    Single(String),
    Multiple(Vec<String>),
    File(PathBuf),
}

impl Target {
    /// Prepare the target into the single string an adapter's argv needs:
    /// trims a single target, comma-joins multiple, or passes a file path
    /// through unchanged.
    pub fn prepare(&self) -> Result<String, String> {
        match self {
            Target::Single(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err("no valid targets provided".to_string());
                }
                Ok(trimmed.to_string())
            }
            Target::Multiple(items) => {
                if items.is_empty() {
                    return Err("no valid targets provided".to_string());
                }
                Ok(items
                    .iter()
                    .map(|s| s.trim())
                    .collect::<Vec<_>>()
                    .join(","))
            }
            Target::File(path) => {
                if !path.is_file() {
                    return Err(format!("target file not found: {}", path.display()));
                }
                Ok(path.display().to_string())
            }
        }
    }

    /// The individual hosts/URLs this target expands to, for adapters
    /// (like the directory/subdomain fuzzer) that must fan out one
    /// invocation per host rather than passing a joined list.
    pub fn hosts(&self) -> Vec<String> {
        match self {
            Target::Single(s) => vec![s.trim().to_string()],
            Target::Multiple(items) => items.iter().map(|s| s.trim().to_string()).collect(),
            Target::File(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_joins_multiple_with_comma() {
        let target = Target::Multiple(vec!["a.com".into(), " b.com ".into()]);
        assert_eq!(target.prepare().unwrap(), "a.com,b.com");
    }

    #[test]
    fn prepare_rejects_empty_single() {
        let target = Target::Single("   ".into());
        assert!(target.prepare().is_err());
    }

    #[test]
    fn prepare_rejects_missing_file() {
        let target = Target::File("/no/such/file/bountyforge-test".into());
        assert!(target.prepare().is_err());
    }
}
