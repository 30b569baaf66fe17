//! Wall-clock and HTTP date helpers.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Local, NaiveDateTime, TimeZone};

/// Current wall-clock time in whole seconds since the Unix epoch.
pub fn epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Parses an RFC-1123-style date string into epoch seconds.
///
/// Accepts the `"Mon, 01 Jan 2024 00:00:00 UTC"` shape autoindex servers
/// emit. The trailing zone token is accepted but ignored; the stamp is
/// interpreted in local time, matching `strptime` + `mktime`.
pub fn parse_http_date(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    let datetime = match trimmed.rsplit_once(' ') {
        Some((head, zone)) if is_zone_token(zone) => head,
        _ => trimmed,
    };
    let naive = NaiveDateTime::parse_from_str(datetime, "%a, %d %b %Y %H:%M:%S").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
}

fn is_zone_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-')
}
