use std::env;
use std::error::Error;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::logger::{parse_level, LoggerConfig};
use crate::sensor::TemperatureConfig;

pub const DEFAULT_SENSOR_ID: &str = "TEMP001";
pub const DEFAULT_CSV_FILE: &str = "sensor_data.csv";
const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 1000;
const DEFAULT_STATS_EVERY: u64 = 100;

/// Everything the monitoring binary needs, resolved from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub logger: LoggerConfig,
    pub temperature: TemperatureConfig,
    pub sensor_id: String,
    pub csv_path: PathBuf,
    pub sample_interval: Duration,
    /// Print statistics after this many successful samples
    pub stats_every: u64,
}

impl AppConfig {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        // Load environment variables
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    ///
    /// Missing keys take their defaults; present but malformed values are
    /// an error. Level names are parsed leniently.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = LoggerConfig::default();
        let logger = LoggerConfig {
            destination_path: lookup("EDGETRACK_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.destination_path),
            minimum_level: lookup("EDGETRACK_LOG_LEVEL")
                .map(|name| parse_level(&name))
                .unwrap_or(defaults.minimum_level),
            console_enabled: flag(&lookup, "EDGETRACK_LOG_CONSOLE", defaults.console_enabled)?,
            file_enabled: flag(&lookup, "EDGETRACK_LOG_TO_FILE", defaults.file_enabled)?,
            timestamp_enabled: flag(&lookup, "EDGETRACK_LOG_TIMESTAMP", defaults.timestamp_enabled)?,
            sensor_payload_enabled: flag(
                &lookup,
                "EDGETRACK_LOG_SENSOR_DATA",
                defaults.sensor_payload_enabled,
            )?,
            max_file_size_bytes: number(&lookup, "EDGETRACK_LOG_MAX_BYTES", defaults.max_file_size_bytes)?,
            max_rotated_files: number(&lookup, "EDGETRACK_LOG_MAX_FILES", defaults.max_rotated_files)?,
        };

        let sample_interval_ms = number(&lookup, "EDGETRACK_SAMPLE_INTERVAL_MS", DEFAULT_SAMPLE_INTERVAL_MS)?;
        if sample_interval_ms == 0 {
            return Err("EDGETRACK_SAMPLE_INTERVAL_MS must be greater than zero".into());
        }

        let base = TemperatureConfig::default();
        let temperature = TemperatureConfig {
            min_temp: number(&lookup, "EDGETRACK_TEMP_MIN", base.min_temp)?,
            max_temp: number(&lookup, "EDGETRACK_TEMP_MAX", base.max_temp)?,
            alert_threshold: number(&lookup, "EDGETRACK_TEMP_ALERT", base.alert_threshold)?,
            critical_threshold: number(&lookup, "EDGETRACK_TEMP_CRITICAL", base.critical_threshold)?,
            calibration_offset: number(&lookup, "EDGETRACK_TEMP_OFFSET", base.calibration_offset)?,
            // Sensor throttle matches the loop interval
            sampling_rate_ms: sample_interval_ms,
            ..base
        };
        temperature
            .validate()
            .map_err(|_| "Temperature range or thresholds are inconsistent (need MIN < MAX and ALERT <= CRITICAL)")?;

        let sensor_id = lookup("EDGETRACK_SENSOR_ID").unwrap_or_else(|| DEFAULT_SENSOR_ID.to_string());
        if sensor_id.trim().is_empty() || sensor_id.contains(',') {
            return Err(format!("Invalid EDGETRACK_SENSOR_ID: '{}'", sensor_id).into());
        }

        Ok(AppConfig {
            logger,
            temperature,
            sensor_id,
            csv_path: lookup("EDGETRACK_CSV_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_FILE)),
            sample_interval: Duration::from_millis(sample_interval_ms),
            stats_every: number(&lookup, "EDGETRACK_STATS_EVERY", DEFAULT_STATS_EVERY)?.max(1),
        })
    }
}

fn number<F, T>(lookup: &F, key: &str, default: T) -> Result<T, Box<dyn Error>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("Invalid value '{}' for {}: {}", raw, key, e).into()),
        None => Ok(default),
    }
}

fn flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool, Box<dyn Error>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("Invalid boolean '{}' for {}", raw, key).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LogLevel;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, Box<dyn Error>> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.logger, LoggerConfig::default());
        assert_eq!(config.temperature, TemperatureConfig::default());
        assert_eq!(config.sensor_id, "TEMP001");
        assert_eq!(config.csv_path, PathBuf::from("sensor_data.csv"));
        assert_eq!(config.sample_interval, Duration::from_secs(1));
        assert_eq!(config.stats_every, 100);
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("EDGETRACK_LOG_FILE", "/var/log/edge/app.log"),
            ("EDGETRACK_LOG_LEVEL", "debug"),
            ("EDGETRACK_LOG_CONSOLE", "off"),
            ("EDGETRACK_LOG_MAX_BYTES", "4096"),
            ("EDGETRACK_LOG_MAX_FILES", "2"),
            ("EDGETRACK_TEMP_ALERT", "30.5"),
            ("EDGETRACK_SENSOR_ID", "TEMP042"),
        ])
        .unwrap();

        assert_eq!(config.logger.destination_path, PathBuf::from("/var/log/edge/app.log"));
        assert_eq!(config.logger.minimum_level, LogLevel::Debug);
        assert!(!config.logger.console_enabled);
        assert_eq!(config.logger.max_file_size_bytes, 4096);
        assert_eq!(config.logger.max_rotated_files, 2);
        assert_eq!(config.temperature.alert_threshold, 30.5);
        assert_eq!(config.sensor_id, "TEMP042");
    }

    #[test]
    fn sample_interval_also_sets_sensor_rate() {
        let config = load(&[("EDGETRACK_SAMPLE_INTERVAL_MS", "250")]).unwrap();
        assert_eq!(config.sample_interval, Duration::from_millis(250));
        assert_eq!(config.temperature.sampling_rate_ms, 250);
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let config = load(&[("EDGETRACK_LOG_LEVEL", "loud")]).unwrap();
        assert_eq!(config.logger.minimum_level, LogLevel::Info);
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(load(&[("EDGETRACK_LOG_MAX_BYTES", "lots")]).is_err());
        assert!(load(&[("EDGETRACK_LOG_TO_FILE", "maybe")]).is_err());
        assert!(load(&[("EDGETRACK_TEMP_MIN", "60")]).is_err());
        assert!(load(&[("EDGETRACK_SAMPLE_INTERVAL_MS", "0")]).is_err());
        assert!(load(&[("EDGETRACK_SENSOR_ID", "A,B")]).is_err());
    }
}
