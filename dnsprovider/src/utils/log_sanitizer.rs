//! Log sanitization utilities
//!
//! Record values (DKIM keys, SPF policies, verification tokens) and raw backend
//! messages can be long or sensitive; these helpers keep debug/error logs short.

/// Maximum number of bytes of a single value included in log output.
const TRUNCATE_LIMIT: usize = 128;

/// Maximum number of values listed before the rest are elided.
const MAX_LISTED_VALUES: usize = 4;

/// MSRV-compatible replacement for `str::floor_char_boundary` (stable since 1.91.0).
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        s.len()
    } else {
        let mut i = index;
        while i > 0 && !s.is_char_boundary(i) {
            i -= 1;
        }
        i
    }
}

/// Truncate a string for safe logging.
///
/// Strings longer than the limit keep their head and gain a suffix with the
/// total byte length.
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

/// Render a record set's value list for logging.
///
/// Each value is truncated and at most a handful are listed:
/// `["10.0.0.1", "10.0.0.2", ... +3 more]`.
pub fn summarize_values<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut listed = Vec::new();
    let mut hidden = 0_usize;
    for value in values {
        if listed.len() < MAX_LISTED_VALUES {
            listed.push(format!("{:?}", truncate_for_log(value)));
        } else {
            hidden += 1;
        }
    }

    if hidden == 0 {
        format!("[{}]", listed.join(", "))
    } else {
        format!("[{}, ... +{hidden} more]", listed.join(", "))
    }
}
