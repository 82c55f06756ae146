//! Stage-to-stage target projection.
//!
//! Each projection is a pure function from the previous working target
//! set plus the stage's parsed records to the next working set. Order is
//! preserved and duplicates are dropped on first sight.

use std::collections::HashSet;

use bountyforge_core::record::ParsedRecord;
use bountyforge_core::stage::StageName;

/// Append `items` onto `current`, preserving order and dropping anything
/// already present in `current` or earlier in `items`.
fn dedup_union(current: &[String], items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen: HashSet<String> = current.iter().cloned().collect();
    let mut out = current.to_vec();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

/// Build the next working target set given the stage that just ran and
/// its parsed output. `StageName::TemplateScan` is terminal and always
/// returns `current` unchanged.
pub fn project(stage: StageName, current: &[String], parsed: &[ParsedRecord]) -> Vec<String> {
    match stage {
        StageName::SubdomainEnum | StageName::DnsBruteforce => {
            dedup_union(current, parsed.iter().filter_map(|r| r.host().map(str::to_string)))
        }
        StageName::PortScan => {
            let mut seen = HashSet::new();
            let mut out = Vec::new();
            for record in parsed {
                if let (Some(host), Some(port)) = (record.host(), record.port()) {
                    // `port` may carry a trailing `/proto` (e.g. `80/tcp`);
                    // the working target set wants the bare port number.
                    let port_number = port.split('/').next().unwrap_or(port);
                    let pair = format!("{host}:{port_number}");
                    if seen.insert(pair.clone()) {
                        out.push(pair);
                    }
                }
            }
            out
        }
        StageName::HttpProbe => {
            let mut seen = HashSet::new();
            let mut out = Vec::new();
            for record in parsed {
                let Some(url) = record.url() else { continue };
                if record.status().is_some_and(|s| s >= 400) {
                    continue;
                }
                if seen.insert(url.to_string()) {
                    out.push(url.to_string());
                }
            }
            out
        }
        StageName::DirectoryBruteforce => {
            dedup_union(current, parsed.iter().filter_map(|r| r.url().map(str::to_string)))
        }
        StageName::TemplateScan => current.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(host: &str) -> ParsedRecord {
        ParsedRecord::new("test", host).with_field("host", host)
    }

    #[test]
    fn subdomain_enum_unions_hosts() {
        let current = vec!["a.com".to_string()];
        let parsed = vec![record("b.com"), record("a.com")];
        let next = project(StageName::SubdomainEnum, &current, &parsed);
        assert_eq!(next, vec!["a.com".to_string(), "b.com".to_string()]);
    }

    #[test]
    fn http_probe_drops_error_statuses() {
        let record_ok = ParsedRecord::new("httpx", "https://a.com")
            .with_field("url", "https://a.com")
            .with_field("status", 200);
        let record_err = ParsedRecord::new("httpx", "https://b.com")
            .with_field("url", "https://b.com")
            .with_field("status", 404);
        let next = project(StageName::HttpProbe, &[], &[record_ok, record_err]);
        assert_eq!(next, vec!["https://a.com".to_string()]);
    }

    #[test]
    fn port_scan_replaces_with_host_port_pairs() {
        let record = ParsedRecord::new("nmap", "10.0.0.1")
            .with_field("host", "10.0.0.1")
            .with_field("port", "80/tcp");
        let next = project(StageName::PortScan, &["10.0.0.1".to_string()], &[record]);
        assert_eq!(next, vec!["10.0.0.1:80".to_string()]);
    }

    #[test]
    fn port_scan_projection_matches_spec_scenario() {
        let records = vec![
            ParsedRecord::new("nmap", "h1").with_field("host", "h1").with_field("port", "80/tcp"),
            ParsedRecord::new("nmap", "h1").with_field("host", "h1").with_field("port", "443/tcp"),
            ParsedRecord::new("nmap", "h2").with_field("host", "h2").with_field("port", "22/tcp"),
        ];
        let next = project(StageName::PortScan, &[], &records);
        assert_eq!(next, vec!["h1:80".to_string(), "h1:443".to_string(), "h2:22".to_string()]);
    }

    #[test]
    fn template_scan_is_a_no_op_projection() {
        let current = vec!["https://a.com".to_string()];
        assert_eq!(project(StageName::TemplateScan, &current, &[]), current);
    }
}
