/// Data types shared by sensors, the statistics aggregator and the logger
use std::fmt;

/// Physical quantity measured by a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Temperature,
    Humidity,
    Pressure,
    Gas,
    Vibration,
    Current,
    Voltage,
    Power,
    Flow,
    Level,
    Position,
    Speed,
    Acceleration,
    Gyroscope,
    Magnetic,
}

impl SensorKind {
    /// Display name used in log lines and CSV rows
    pub fn name(self) -> &'static str {
        match self {
            SensorKind::Temperature => "Temperature",
            SensorKind::Humidity => "Humidity",
            SensorKind::Pressure => "Pressure",
            SensorKind::Gas => "Gas",
            SensorKind::Vibration => "Vibration",
            SensorKind::Current => "Current",
            SensorKind::Voltage => "Voltage",
            SensorKind::Power => "Power",
            SensorKind::Flow => "Flow",
            SensorKind::Level => "Level",
            SensorKind::Position => "Position",
            SensorKind::Speed => "Speed",
            SensorKind::Acceleration => "Acceleration",
            SensorKind::Gyroscope => "Gyroscope",
            SensorKind::Magnetic => "Magnetic",
        }
    }

    /// Unit of measurement; fixed per kind
    pub fn unit(self) -> &'static str {
        match self {
            SensorKind::Temperature => "°C",
            SensorKind::Humidity => "%",
            SensorKind::Pressure => "kPa",
            SensorKind::Gas => "ppm",
            SensorKind::Vibration => "g",
            SensorKind::Current => "A",
            SensorKind::Voltage => "V",
            SensorKind::Power => "W",
            SensorKind::Flow => "L/min",
            SensorKind::Level => "m",
            SensorKind::Position => "mm",
            SensorKind::Speed => "rpm",
            SensorKind::Acceleration => "m/s²",
            SensorKind::Gyroscope => "°/s",
            SensorKind::Magnetic => "µT",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fault classification carried on a reading or returned by a failed read.
///
/// `None` is the only variant a valid reading may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum SensorFault {
    #[error("No error")]
    None,
    #[error("Invalid parameter")]
    InvalidParameter,
    #[error("Initialization failed")]
    InitFailed,
    #[error("Read operation failed")]
    ReadFailed,
    #[error("Value out of range")]
    OutOfRange,
    #[error("Hardware error")]
    Hardware,
    #[error("Memory allocation failed")]
    Memory,
    #[error("Communication error")]
    Communication,
    #[error("Calibration error")]
    Calibration,
}

impl SensorFault {
    /// Text used in the `Error:` field of log lines and CSV rows
    pub fn label(self) -> String {
        match self {
            SensorFault::None => "No Error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Business threshold crossed by a value, independent of its validity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ThresholdLevel {
    #[default]
    Normal,
    Alert,
    Critical,
}

/// One timestamped measurement with validity metadata
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub sensor_kind: SensorKind,
    pub value: f64,
    /// Seconds since the Unix epoch
    pub captured_at: i64,
    pub is_valid: bool,
    pub fault: SensorFault,
    pub threshold: ThresholdLevel,
}

impl SensorReading {
    /// A valid reading with no fault and no threshold crossing
    pub fn new(sensor_kind: SensorKind, value: f64, captured_at: i64) -> Self {
        Self {
            sensor_kind,
            value,
            captured_at,
            is_valid: true,
            fault: SensorFault::None,
            threshold: ThresholdLevel::Normal,
        }
    }

    /// Marks the reading unusable. A `None` fault leaves it untouched.
    pub fn with_fault(mut self, fault: SensorFault) -> Self {
        if fault != SensorFault::None {
            self.fault = fault;
            self.is_valid = false;
        }
        self
    }

    pub fn with_threshold(mut self, threshold: ThresholdLevel) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn unit(&self) -> &'static str {
        self.sensor_kind.unit()
    }
}
