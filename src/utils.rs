/// Timestamp helpers shared by the log formatter and the CSV exporter
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Format a timestamp for log lines and CSV rows
///
/// Produces `YYYY-MM-DD HH:MM:SS`. Falls back to the default string
/// representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    dt.format(format).unwrap_or_else(|_| dt.to_string())
}

/// The machine's UTC offset, or UTC if it cannot be determined
///
/// On Unix this only succeeds while the process is single-threaded, so
/// call it before starting the async runtime and pass the result along.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Current wall-clock time at `offset`
pub fn now_in(offset: UtcOffset) -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(offset)
}

/// Seconds since the Unix epoch
pub fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
