use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

/// The format SQLite's datetime('now') writes. occurred_at is stored the
/// same way so it sorts lexicographically alongside the generated columns.
const DB_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn to_db_time(dt: DateTime<Utc>) -> String {
    dt.format(DB_TIME_FORMAT).to_string()
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC and convert; corrupt values are logged and zeroed
/// rather than failing the whole response.
pub(crate) fn from_db_time(raw: &str, field: &str, id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, DB_TIME_FORMAT).map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt {} '{}' on '{}': {}", field, raw, id, e);
            DateTime::default()
        })
}
