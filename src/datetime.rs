use chrono::{DateTime, Utc};

pub const CHART_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn display_datetime(datetime: DateTime<Utc>) -> String {
    datetime.with_timezone(&chrono::Local).to_rfc3339()
}

/// UTC, second precision, no timezone suffix.
pub fn chart_timestamp(datetime: DateTime<Utc>) -> String {
    datetime.format(CHART_TIMESTAMP_FORMAT).to_string()
}
