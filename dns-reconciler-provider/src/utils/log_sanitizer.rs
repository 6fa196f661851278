//! Log-safe rendering of record values
//!
//! TXT values (DKIM keys, SPF policies, verification tokens) can run to
//! kilobytes. Everything written to logs goes through here first.

use crate::types::Rdata;

/// Maximum number of bytes of one value kept in log output.
const TRUNCATE_LIMIT: usize = 256;

/// Maximum number of values listed before eliding the rest.
const MAX_LISTED: usize = 8;

/// Largest char boundary at or below `index`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (0..=index).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

/// Truncate a string for safe logging.
///
/// Strings over the limit keep their head and gain a suffix with the total length.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}

/// Render a record set's values as `[{..}, {..}]`, truncating each value and
/// eliding everything past the first few.
pub fn summarize_records(records: &[Rdata]) -> String {
    let mut listed: Vec<String> = records
        .iter()
        .take(MAX_LISTED)
        .map(|rdata| truncate_for_log(&rdata.to_string()))
        .collect();
    if records.len() > MAX_LISTED {
        listed.push(format!("... {} more", records.len() - MAX_LISTED));
    }
    format!("[{}]", listed.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_value_unchanged() {
        assert_eq!(truncate_for_log("v=spf1 -all"), "v=spf1 -all");
    }

    #[test]
    fn long_value_truncated_on_char_boundary() {
        let s = "é".repeat(200);
        let out = truncate_for_log(&s);
        assert!(out.ends_with("[truncated, total 400 bytes]"));
        assert!(out.starts_with(&"é".repeat(128)));
    }

    #[test]
    fn summary_lists_values() {
        let records = vec![
            Rdata::new().with("address", "192.0.2.1"),
            Rdata::new().with("address", "192.0.2.2"),
        ];
        assert_eq!(
            summarize_records(&records),
            "[{address=192.0.2.1}, {address=192.0.2.2}]"
        );
        assert_eq!(summarize_records(&[]), "[]");
    }

    #[test]
    fn summary_elides_past_limit() {
        let records: Vec<Rdata> = (0..10)
            .map(|i| Rdata::new().with("address", format!("192.0.2.{i}")))
            .collect();
        let out = summarize_records(&records);
        assert!(out.ends_with("... 2 more]"));
        assert!(!out.contains("192.0.2.9"));
    }
}
