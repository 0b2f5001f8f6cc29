//! Sensor -> statistics -> logger -> CSV, wired the way the monitoring
//! loop wires them.

use std::collections::VecDeque;
use std::fs;
use std::time::{Duration, Instant};

use edgetrack::export::{CsvExporter, CSV_HEADER};
use edgetrack::logger::{Logger, LoggerConfig};
use edgetrack::models::{SensorFault, ThresholdLevel};
use edgetrack::sensor::{severity, RawSample, Sensor, TemperatureConfig, TemperatureSensor, TemperatureSource};
use time::macros::datetime;

struct Replay(VecDeque<f64>);

impl TemperatureSource for Replay {
    fn sample(&mut self, with_humidity: bool) -> Result<RawSample, SensorFault> {
        let temperature = self.0.pop_front().ok_or(SensorFault::Communication)?;
        Ok(RawSample {
            temperature,
            humidity: with_humidity.then_some(48.0),
        })
    }
}

#[test]
fn readings_flow_into_log_and_csv() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let log_path = dir.path().join("logs/edgetrack.log");
    let csv_path = dir.path().join("sensor_data.csv");

    let logger = Logger::new();
    logger
        .init(LoggerConfig {
            destination_path: log_path.clone(),
            console_enabled: false,
            timestamp_enabled: false,
            ..Default::default()
        })
        .expect("init logger");
    let mut csv = CsvExporter::create(&csv_path).expect("create csv");

    let config = TemperatureConfig {
        sampling_rate_ms: 100,
        ..Default::default()
    };
    let source = Replay(VecDeque::from(vec![24.0, 41.5, 46.25, 51.0]));
    let mut sensor = TemperatureSensor::new("TEMP001", config, source).expect("valid config");
    sensor.initialize().expect("initialize sensor");

    let start = Instant::now();
    let at = datetime!(2025-02-10 08:30:00 UTC);
    let mut levels = Vec::new();
    for i in 0..5u64 {
        match sensor.read_at(start + Duration::from_millis(100 * i)) {
            Ok(reading) => {
                levels.push(reading.threshold);
                assert!(logger.log_reading("TEMP001", "Temperature", &reading, severity(&reading)));
                csv.append("TEMP001", "Temperature", &reading, &at).expect("append row");
            }
            Err(fault) => assert_eq!(fault, SensorFault::Communication),
        }
    }
    logger.teardown();

    assert_eq!(
        levels,
        vec![
            ThresholdLevel::Normal,
            ThresholdLevel::Alert,
            ThresholdLevel::Critical,
            ThresholdLevel::Normal,
        ]
    );

    let stats = sensor.stats();
    assert_eq!(stats.sample_count, 3);
    assert_eq!(stats.alert_count, 2);
    assert_eq!(stats.critical_count, 1);
    assert_eq!(stats.min_value, Some(24.0));
    assert_eq!(stats.max_value, Some(46.25));
    assert_eq!(sensor.info().sample_count, 5);
    assert_eq!(sensor.info().error_count, 2);

    let log = fs::read_to_string(&log_path).expect("read log");
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(
        lines,
        vec![
            "[INFO] Logger initialized",
            "[INFO] Sensor: TEMP001, Type: Temperature, Value: 24.00°C, Valid: Yes, Error: No Error",
            "[WARNING] Sensor: TEMP001, Type: Temperature, Value: 41.50°C, Valid: Yes, Error: No Error",
            "[CRITICAL] Sensor: TEMP001, Type: Temperature, Value: 46.25°C, Valid: Yes, Error: No Error",
            "[ERROR] Sensor: TEMP001, Type: Temperature, Value: 51.00°C, Valid: No, Error: Value out of range",
            "[INFO] Logger shutting down",
        ]
    );

    let rows = fs::read_to_string(&csv_path).expect("read csv");
    let rows: Vec<&str> = rows.lines().collect();
    assert_eq!(rows[0], CSV_HEADER);
    assert_eq!(rows.len(), 5);
    assert_eq!(
        rows[4],
        "2025-02-10 08:30:00,TEMP001,Temperature,51.00,°C,Invalid,Value out of range"
    );
}
