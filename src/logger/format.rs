/// Log levels and line formatting
use std::fmt;
use time::OffsetDateTime;

use crate::models::SensorReading;
use crate::utils::format_datetime;

const LEVEL_LABELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

/// Severity of a log record, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warning = 2,
    Error = 3,
    Critical = 4,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    pub fn from_index(raw: u8) -> Option<LogLevel> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn as_str(self) -> &'static str {
        LEVEL_LABELS[self as usize]
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Error | LogLevel::Critical => log::LevelFilter::Error,
        }
    }
}

/// Label for a raw numeric level; `UNKNOWN` when out of range
pub fn level_label(raw: u8) -> &'static str {
    LogLevel::from_index(raw).map_or("UNKNOWN", LogLevel::as_str)
}

/// Case-insensitive level lookup. Unknown names fall back to `Info`.
pub fn parse_level(name: &str) -> LogLevel {
    let name = name.trim();
    LogLevel::ALL
        .into_iter()
        .find(|level| level.as_str().eq_ignore_ascii_case(name))
        .unwrap_or(LogLevel::Info)
}

/// Render one display line, without the trailing newline
///
/// `[YYYY-MM-DD HH:MM:SS] [LEVEL] message` with timestamps enabled,
/// `[LEVEL] message` otherwise.
pub fn format_line(
    level: LogLevel,
    message: &str,
    timestamp_enabled: bool,
    now: &OffsetDateTime,
) -> String {
    if timestamp_enabled {
        format!("[{}] [{}] {}", format_datetime(now), level, message)
    } else {
        format!("[{}] {}", level, message)
    }
}

/// Fixed-field message body describing a sensor reading
pub fn format_reading(sensor_id: &str, kind_name: &str, reading: &SensorReading) -> String {
    format!(
        "Sensor: {}, Type: {}, Value: {:.2}{}, Valid: {}, Error: {}",
        sensor_id,
        kind_name,
        reading.value,
        reading.unit(),
        if reading.is_valid { "Yes" } else { "No" },
        reading.fault.label()
    )
}
