//! Shared JSON-per-line parsing for tools that emit one JSON object per
//! line of stdout (subfinder, httpx, nuclei). Malformed lines are
//! skipped and logged rather than failing the whole parse.

use serde_json::Value;
use tracing::warn;

/// Parse each non-blank line of `output` as a JSON object, calling
/// `tool` only for log context.
pub fn parse_lines(tool: &str, output: &str) -> Vec<Value> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<Value>(line) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(tool, line, error = %e, "skipping unparsable output line");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_malformed_lines() {
        let output = "{\"a\":1}\nnot json\n{\"a\":2}\n";
        let values = parse_lines("test", output);
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn empty_output_yields_empty_vec() {
        assert!(parse_lines("test", "").is_empty());
    }
}
