//! Header validation/rendering shared by HTTP-speaking adapters
//! (`httpx`, `nuclei`).

use std::collections::HashMap;

/// Reject headers whose name contains `:`, or whose key/value is not a
/// plain string.
pub fn validate_headers(headers: &HashMap<String, String>) -> Result<(), String> {
    for key in headers.keys() {
        if key.contains(':') {
            return Err(format!("header name cannot contain ':': {key}"));
        }
    }
    Ok(())
}

/// Render headers as repeated `-H "Key: Value"` argv pairs.
pub fn header_flags(headers: &HashMap<String, String>) -> Vec<String> {
    let mut flags = Vec::with_capacity(headers.len() * 2);
    let mut keys: Vec<_> = headers.keys().collect();
    keys.sort();
    for key in keys {
        flags.push("-H".to_string());
        flags.push(format!("{key}: {}", headers[key]));
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_colon_in_header_name() {
        let mut headers = HashMap::new();
        headers.insert("Bad:Name".to_string(), "value".to_string());
        assert!(validate_headers(&headers).is_err());
    }

    #[test]
    fn renders_sorted_header_flags() {
        let mut headers = HashMap::new();
        headers.insert("User-Agent".to_string(), "bf".to_string());
        headers.insert("Accept".to_string(), "*/*".to_string());
        assert_eq!(
            header_flags(&headers),
            vec!["-H", "Accept: */*", "-H", "User-Agent: bf"]
        );
    }
}
