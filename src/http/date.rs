//! HTTP date handling.
//!
//! Three formats are accepted on input (RFC 1123, RFC 850, ANSI C asctime);
//! output is always RFC 1123 in GMT.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Header names whose values must parse as dates.
pub const DATE_HEADERS: [&str; 4] = ["Date", "Expires", "If-Modified-Since", "Last-Modified"];

const RFC1123: &str = "%a, %d %b %Y %H:%M:%S";
const RFC850: &str = "%A, %d-%b-%y %H:%M:%S";
const ANSIC: &str = "%a %b %e %H:%M:%S %Y";

pub fn is_date_header(canonical_name: &str) -> bool {
    DATE_HEADERS.contains(&canonical_name)
}

/// Format a timestamp as `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn now() -> String {
    format_http_date(Utc::now())
}

/// Parse a date in any of the accepted formats.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    // RFC 1123 and RFC 850 end in a zone abbreviation; both are read as UTC.
    if let Some((stamp, zone)) = value.rsplit_once(' ') {
        if !zone.is_empty() && zone.chars().all(|c| c.is_ascii_alphabetic()) {
            for format in [RFC1123, RFC850] {
                if let Ok(parsed) = NaiveDateTime::parse_from_str(stamp, format) {
                    return Some(parsed.and_utc());
                }
            }
        }
    }

    NaiveDateTime::parse_from_str(value, ANSIC)
        .ok()
        .map(|parsed| parsed.and_utc())
}
