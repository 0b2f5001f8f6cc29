//! Edge-device monitoring harness: sensors, running statistics and a
//! size-bounded rotating event log.

pub mod config;
pub mod export;
pub mod logger;
pub mod models;
pub mod sensor;
pub mod stats;
pub mod utils;

pub use logger::{InitError, LogLevel, Logger, LoggerConfig};
pub use models::{SensorFault, SensorKind, SensorReading, ThresholdLevel};
pub use sensor::Sensor;
pub use stats::{Stats, StatisticsAggregator};
