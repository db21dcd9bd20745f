/*!
 * Utility functions for treedump
 */

use std::collections::BTreeSet;
use std::time::SystemTime;

use chrono::{DateTime, Local, SecondsFormat, Utc};

use crate::config::TimeZone;

/// Format a timestamp as an ISO-8601 offset date-time in the given zone
pub fn format_timestamp(time: SystemTime, zone: &TimeZone) -> String {
    let utc: DateTime<Utc> = time.into();
    match zone {
        TimeZone::Local => utc
            .with_timezone(&Local)
            .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        TimeZone::Fixed(offset) => utc
            .with_timezone(offset)
            .to_rfc3339_opts(SecondsFormat::AutoSi, true),
    }
}

/// Render excluded directory names the way the dump header lists them
pub fn format_name_list(names: &BTreeSet<String>) -> String {
    let joined: Vec<&str> = names.iter().map(String::as_str).collect();
    format!("[{}]", joined.join(", "))
}

/// Inverse of `format_name_list`
pub fn parse_name_list(text: &str) -> BTreeSet<String> {
    let inner = text
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']');
    inner
        .split(", ")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
