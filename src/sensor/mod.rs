/// Sensor capability interface and per-sensor bookkeeping
pub mod temperature;

use crate::logger::LogLevel;
use crate::models::{SensorFault, SensorKind, SensorReading, ThresholdLevel};

pub use temperature::{
    dew_point, heat_index, RawSample, SimulatedSource, TemperatureConfig, TemperatureSensor,
    TemperatureSensorData, TemperatureSource,
};

/// A device that produces [`SensorReading`]s
///
/// A hard failure (no value at all) is an `Err`. A value that was read but
/// is unusable comes back as `Ok` with `is_valid == false` and a fault.
pub trait Sensor {
    fn info(&self) -> &SensorInfo;
    fn initialize(&mut self) -> Result<(), SensorFault>;
    fn read(&mut self) -> Result<SensorReading, SensorFault>;
    fn cleanup(&mut self);
}

/// Identity and health counters common to every sensor
#[derive(Debug, Clone, PartialEq)]
pub struct SensorInfo {
    pub id: String,
    pub kind: SensorKind,
    pub name: String,
    pub location: String,
    /// Read attempts, including throttled and failed ones
    pub sample_count: u64,
    /// Failed reads plus reads that produced an invalid value
    pub error_count: u64,
    pub last_error: SensorFault,
}

impl SensorInfo {
    pub fn new(id: &str, kind: SensorKind) -> Result<Self, SensorFault> {
        if id.trim().is_empty() {
            return Err(SensorFault::InvalidParameter);
        }
        Ok(Self {
            id: id.to_string(),
            kind,
            name: String::new(),
            location: String::new(),
            sample_count: 0,
            error_count: 0,
            last_error: SensorFault::None,
        })
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    /// Update the counters from the outcome of one read attempt
    pub fn track(&mut self, result: &Result<SensorReading, SensorFault>) {
        self.sample_count += 1;
        let fault = match result {
            Ok(reading) if reading.is_valid => SensorFault::None,
            Ok(reading) => reading.fault,
            Err(fault) => *fault,
        };
        if fault != SensorFault::None {
            self.error_count += 1;
        }
        self.last_error = fault;
    }
}

/// Log level a reading should be recorded at
pub fn severity(reading: &SensorReading) -> LogLevel {
    if !reading.is_valid {
        return LogLevel::Error;
    }
    match reading.threshold {
        ThresholdLevel::Normal => LogLevel::Info,
        ThresholdLevel::Alert => LogLevel::Warning,
        ThresholdLevel::Critical => LogLevel::Critical,
    }
}
