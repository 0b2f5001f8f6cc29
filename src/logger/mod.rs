/// Structured event logging to the console and a rotating log file
///
/// [`Logger`] is an explicitly constructed handle; there is no process-wide
/// instance. All mutable state (configuration, sinks, byte counter) sits
/// behind one mutex, so a format + write + rotation check runs as a single
/// unit and concurrent callers never interleave partial lines.
pub mod format;
pub mod sink;

use log::{error, warn};
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use time::{OffsetDateTime, UtcOffset};

use crate::models::SensorReading;
use crate::utils::{local_offset, now_in};

pub use format::{format_line, format_reading, level_label, parse_level, LogLevel};
pub use sink::{ConsoleSink, LogSink, RotatingFileSink};

pub const DEFAULT_LOG_FILE: &str = "logs/edgetrack.log";
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 1024 * 1024;
pub const DEFAULT_MAX_ROTATED_FILES: u32 = 5;

const ROTATED_MESSAGE: &str = "Log file rotated";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Active log file; backups get a numeric suffix
    pub destination_path: PathBuf,
    pub minimum_level: LogLevel,
    pub console_enabled: bool,
    pub file_enabled: bool,
    pub timestamp_enabled: bool,
    /// When false, `log_reading` records nothing
    pub sensor_payload_enabled: bool,
    /// Zero disables rotation
    pub max_file_size_bytes: u64,
    pub max_rotated_files: u32,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            destination_path: PathBuf::from(DEFAULT_LOG_FILE),
            minimum_level: LogLevel::Info,
            console_enabled: true,
            file_enabled: true,
            timestamp_enabled: true,
            sensor_payload_enabled: true,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_rotated_files: DEFAULT_MAX_ROTATED_FILES,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("logger is already initialized")]
    AlreadyInitialized,
    #[error("failed to create log directory {path}: {source}")]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open log file {path}: {source}")]
    FileOpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

struct ActiveState {
    config: LoggerConfig,
    file: Option<RotatingFileSink>,
}

struct Inner {
    console: Box<dyn LogSink>,
    active: Option<ActiveState>,
}

impl Inner {
    /// Filter, format and deliver one record, rotating the file at most
    /// once. A file opened over the limit rotates before the write, any
    /// other file after it. `allow_rotation` false skips both.
    fn log(&mut self, level: LogLevel, message: &str, now: &OffsetDateTime, allow_rotation: bool) -> bool {
        let line = match &self.active {
            Some(state) if level >= state.config.minimum_level => {
                format_line(level, message, state.config.timestamp_enabled, now)
            }
            _ => return false,
        };

        let rotated = allow_rotation && self.file_oversized_at_open() && self.rotate_file(now);

        let delivered = self.dispatch(&line);

        if allow_rotation && !rotated && self.file_needs_rotation() {
            self.rotate_file(now);
        }
        delivered
    }

    fn dispatch(&mut self, line: &str) -> bool {
        let Some(state) = self.active.as_mut() else {
            return false;
        };
        let mut delivered = true;

        if state.config.console_enabled {
            if let Err(e) = self.console.write_line(line) {
                warn!("Console log write failed: {}", e);
                delivered = false;
            }
        }

        if state.config.file_enabled {
            if let Some(sink) = state.file.as_mut().filter(|s| s.is_active()) {
                if let Err(e) = sink.write_line(line) {
                    warn!("Log file write to {} failed: {}", sink.path().display(), e);
                    delivered = false;
                }
            }
        }

        delivered
    }

    fn file_needs_rotation(&self) -> bool {
        self.active
            .as_ref()
            .and_then(|state| state.file.as_ref())
            .is_some_and(RotatingFileSink::needs_rotation)
    }

    fn file_oversized_at_open(&self) -> bool {
        self.active
            .as_ref()
            .and_then(|state| state.file.as_ref())
            .is_some_and(RotatingFileSink::oversized_at_open)
    }

    fn rotate_file(&mut self, now: &OffsetDateTime) -> bool {
        let Some(sink) = self.active.as_mut().and_then(|state| state.file.as_mut()) else {
            return false;
        };

        match sink.rotate() {
            Ok(()) => {
                self.log(LogLevel::Info, ROTATED_MESSAGE, now, false);
                true
            }
            Err(e) => {
                error!(
                    "Log rotation of {} failed, file logging suspended: {}",
                    sink.path().display(),
                    e
                );
                false
            }
        }
    }
}

/// Logging facade: `Uninitialized` until [`init`](Logger::init), back to
/// `Uninitialized` after [`teardown`](Logger::teardown)
pub struct Logger {
    inner: Mutex<Inner>,
    utc_offset: UtcOffset,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// An uninitialized logger writing console output to stdout
    pub fn new() -> Self {
        Self::with_console(Box::new(ConsoleSink))
    }

    /// An uninitialized logger with a custom console sink
    pub fn with_console(console: Box<dyn LogSink>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                console,
                active: None,
            }),
            utc_offset: local_offset(),
        }
    }

    /// Stamp lines at `offset` instead of the offset detected at
    /// construction
    ///
    /// The local offset can only be detected while the process is
    /// single-threaded; a binary on a multithreaded runtime resolves it
    /// first and passes it in here.
    pub fn with_utc_offset(mut self, offset: UtcOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    pub fn utc_offset(&self) -> UtcOffset {
        self.utc_offset
    }

    fn now(&self) -> OffsetDateTime {
        now_in(self.utc_offset)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Activate the logger with `config`, opening the log file if file
    /// logging is enabled
    ///
    /// Use `LoggerConfig { .., ..Default::default() }` to override only some
    /// of the defaults. Fails if already active or the file cannot be
    /// opened; the logger stays uninitialized on failure.
    pub fn init(&self, config: LoggerConfig) -> Result<(), InitError> {
        let now = self.now();
        let mut inner = self.lock();
        if inner.active.is_some() {
            return Err(InitError::AlreadyInitialized);
        }

        let file = if config.file_enabled {
            Some(RotatingFileSink::open(
                &config.destination_path,
                config.max_file_size_bytes,
                config.max_rotated_files,
            )?)
        } else {
            None
        };

        inner.active = Some(ActiveState { config, file });
        inner.log(LogLevel::Info, "Logger initialized", &now, true);
        Ok(())
    }

    /// Flush and close the log file and return to uninitialized. No-op
    /// when not initialized.
    pub fn teardown(&self) {
        let now = self.now();
        let mut inner = self.lock();
        if inner.active.is_none() {
            return;
        }

        inner.log(LogLevel::Info, "Logger shutting down", &now, false);
        if let Some(mut state) = inner.active.take() {
            if let Some(sink) = state.file.as_mut() {
                sink.close();
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().active.is_some()
    }

    /// Emit `message` at `level`
    ///
    /// Returns false without side effects when uninitialized or when
    /// `level` is below the configured minimum; also false if an enabled
    /// sink failed to take the line.
    pub fn log(&self, level: LogLevel, message: &str) -> bool {
        let now = self.now();
        self.lock().log(level, message, &now, true)
    }

    /// Emit the fixed-field description of `reading`
    ///
    /// Same filtering as [`log`](Logger::log); additionally returns false
    /// when sensor payload logging is disabled.
    pub fn log_reading(
        &self,
        sensor_id: &str,
        sensor_kind_name: &str,
        reading: &SensorReading,
        level: LogLevel,
    ) -> bool {
        let now = self.now();
        let mut inner = self.lock();
        match &inner.active {
            Some(state) if state.config.sensor_payload_enabled => {}
            _ => return false,
        }

        let message = format_reading(sensor_id, sensor_kind_name, reading);
        inner.log(level, &message, &now, true)
    }

    /// Replace the active configuration
    ///
    /// Size limits apply to the open file immediately. The file itself is
    /// not reopened: a new `destination_path`, or enabling file logging
    /// that was off at `init`, takes effect only after teardown and init.
    pub fn set_config(&self, config: LoggerConfig) {
        let mut inner = self.lock();
        let Some(state) = inner.active.as_mut() else {
            return;
        };

        if config.destination_path != state.config.destination_path {
            warn!(
                "Log destination change to {} ignored until the logger is re-initialized",
                config.destination_path.display()
            );
        }
        if let Some(sink) = state.file.as_mut() {
            sink.set_limits(config.max_file_size_bytes, config.max_rotated_files);
        }
        state.config = config;
    }

    /// Copy of the active configuration, `None` when uninitialized
    pub fn get_config(&self) -> Option<LoggerConfig> {
        self.lock().active.as_ref().map(|state| state.config.clone())
    }

    /// Rotate the log file now, regardless of its size
    ///
    /// Also reopens a file sink suspended by an earlier failed rotation.
    /// Returns whether a fresh file is open afterwards.
    pub fn rotate(&self) -> bool {
        let now = self.now();
        self.lock().rotate_file(&now)
    }

    /// Bytes written to the active log file since it was opened or rotated
    pub fn current_file_size(&self) -> Option<u64> {
        self.lock()
            .active
            .as_ref()
            .and_then(|state| state.file.as_ref())
            .map(RotatingFileSink::current_size_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<String>>>);

    impl Capture {
        fn lines(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl LogSink for Capture {
        fn write_line(&mut self, line: &str) -> io::Result<()> {
            self.0.lock().unwrap().push(line.to_string());
            Ok(())
        }
    }

    fn console_only() -> LoggerConfig {
        LoggerConfig {
            file_enabled: false,
            timestamp_enabled: false,
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let config = LoggerConfig::default();
        assert_eq!(config.destination_path, PathBuf::from("logs/edgetrack.log"));
        assert_eq!(config.minimum_level, LogLevel::Info);
        assert!(config.console_enabled && config.file_enabled);
        assert!(config.timestamp_enabled && config.sensor_payload_enabled);
        assert_eq!(config.max_file_size_bytes, 1_048_576);
        assert_eq!(config.max_rotated_files, 5);
    }

    #[test]
    fn uninitialized_logger_refuses_everything() {
        let capture = Capture::default();
        let logger = Logger::with_console(Box::new(capture.clone()));

        assert!(!logger.is_initialized());
        assert!(!logger.log(LogLevel::Critical, "nobody listens"));
        assert!(!logger.rotate());
        assert_eq!(logger.get_config(), None);
        logger.set_config(console_only());
        logger.teardown();
        assert!(capture.lines().is_empty());
    }

    #[test]
    fn init_logs_and_filters_by_level() {
        let capture = Capture::default();
        let logger = Logger::with_console(Box::new(capture.clone()));
        logger.init(console_only()).expect("init");

        assert!(!logger.log(LogLevel::Debug, "too chatty"));
        assert!(logger.log(LogLevel::Warning, "fan speed low"));

        assert_eq!(
            capture.lines(),
            vec!["[INFO] Logger initialized", "[WARNING] fan speed low"]
        );
    }

    #[test]
    fn second_init_requires_teardown() {
        let capture = Capture::default();
        let logger = Logger::with_console(Box::new(capture.clone()));
        logger.init(console_only()).expect("init");

        assert!(matches!(
            logger.init(console_only()),
            Err(InitError::AlreadyInitialized)
        ));

        logger.teardown();
        logger.teardown();
        assert!(!logger.is_initialized());
        logger.init(console_only()).expect("re-init");
        assert_eq!(capture.lines().last().map(String::as_str), Some("[INFO] Logger initialized"));
        assert!(capture.lines().contains(&"[INFO] Logger shutting down".to_string()));
    }

    #[test]
    fn set_config_replaces_filter() {
        let capture = Capture::default();
        let logger = Logger::with_console(Box::new(capture.clone()));
        logger.init(console_only()).expect("init");

        let mut config = logger.get_config().expect("active config");
        config.minimum_level = LogLevel::Error;
        logger.set_config(config.clone());

        assert_eq!(logger.get_config(), Some(config));
        assert!(!logger.log(LogLevel::Warning, "filtered"));
        assert!(logger.log(LogLevel::Critical, "kept"));
        assert_eq!(capture.lines().last().map(String::as_str), Some("[CRITICAL] kept"));
    }

    #[test]
    fn timestamps_use_the_configured_offset() {
        let capture = Capture::default();
        let offset = UtcOffset::from_hms(-3, 0, 0).expect("valid offset");
        let logger = Logger::with_console(Box::new(capture.clone())).with_utc_offset(offset);
        assert_eq!(logger.utc_offset(), offset);

        logger
            .init(LoggerConfig {
                timestamp_enabled: true,
                ..console_only()
            })
            .expect("init");

        // The clock may tick over between the two reads
        let line = &capture.lines()[0];
        let expected: Vec<String> = [0, 1]
            .iter()
            .map(|s| {
                let at = now_in(offset) - time::Duration::seconds(*s);
                format!("[{}] [INFO] Logger initialized", crate::utils::format_datetime(&at))
            })
            .collect();
        assert!(expected.contains(line), "unexpected line: {line}");
    }

    #[test]
    fn sensor_payload_toggle() {
        use crate::models::{SensorKind, SensorReading};

        let capture = Capture::default();
        let logger = Logger::with_console(Box::new(capture.clone()));
        logger.init(LoggerConfig {
            sensor_payload_enabled: false,
            ..console_only()
        })
        .expect("init");

        let reading = SensorReading::new(SensorKind::Temperature, 22.0, 0);
        assert!(!logger.log_reading("TEMP001", "Temperature", &reading, LogLevel::Info));
        assert_eq!(capture.lines().len(), 1);
    }
}
