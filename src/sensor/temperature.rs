/// Temperature sensor with humidity-derived quantities and running statistics
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

use super::{Sensor, SensorInfo};
use crate::models::{SensorFault, SensorKind, SensorReading};
use crate::stats::{Stats, StatisticsAggregator, Thresholds};
use crate::utils::unix_now;

#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureConfig {
    /// Lowest physically valid temperature, °C
    pub min_temp: f64,
    /// Highest physically valid temperature, °C
    pub max_temp: f64,
    pub alert_threshold: f64,
    pub critical_threshold: f64,
    /// Added to every raw sample
    pub calibration_offset: f64,
    /// Reads closer together than this return the previous reading
    pub sampling_rate_ms: u64,
    pub enable_humidity: bool,
    pub enable_dew_point: bool,
    pub enable_heat_index: bool,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            min_temp: 0.0,
            max_temp: 50.0,
            alert_threshold: 40.0,
            critical_threshold: 45.0,
            calibration_offset: 0.0,
            sampling_rate_ms: 1000,
            enable_humidity: true,
            enable_dew_point: true,
            enable_heat_index: true,
        }
    }
}

impl TemperatureConfig {
    pub fn validate(&self) -> Result<(), SensorFault> {
        if !(self.min_temp < self.max_temp)
            || !(self.alert_threshold <= self.critical_threshold)
            || self.sampling_rate_ms == 0
        {
            return Err(SensorFault::InvalidParameter);
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            alert: self.alert_threshold,
            critical: self.critical_threshold,
        }
    }

    fn sampling_period(&self) -> Duration {
        Duration::from_millis(self.sampling_rate_ms)
    }
}

/// Latest sample together with its derived quantities
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TemperatureSensorData {
    pub temperature: f64,
    /// Relative humidity, percent
    pub humidity: Option<f64>,
    pub dew_point: Option<f64>,
    pub heat_index: Option<f64>,
}

/// Raw output of the measuring hardware, before calibration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub temperature: f64,
    pub humidity: Option<f64>,
}

/// Where raw temperature (and optionally humidity) values come from
pub trait TemperatureSource: Send {
    fn initialize(&mut self) -> Result<(), SensorFault> {
        Ok(())
    }

    fn sample(&mut self, with_humidity: bool) -> Result<RawSample, SensorFault>;

    fn shutdown(&mut self) {}
}

/// Stand-in for real hardware: 25 °C ± 1 and 45–55 % relative humidity
pub struct SimulatedSource {
    rng: StdRng,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sequence for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TemperatureSource for SimulatedSource {
    fn sample(&mut self, with_humidity: bool) -> Result<RawSample, SensorFault> {
        let temperature = 25.0 + self.rng.gen_range(-1.0_f64..=1.0);
        let humidity = with_humidity.then(|| 45.0 + self.rng.gen_range(0.0_f64..=10.0));
        Ok(RawSample {
            temperature,
            humidity,
        })
    }
}

/// Dew point approximation, °C: `T - (100 - RH) / 5`
pub fn dew_point(temperature: f64, humidity: f64) -> f64 {
    temperature - (100.0 - humidity) / 5.0
}

/// Simple heat index approximation, °C
///
/// Evaluated in °F as `0.5 * (F + 61 + (F - 68) * 1.2 + RH * 0.094)`.
pub fn heat_index(temperature: f64, humidity: f64) -> f64 {
    let temp_f = temperature * 9.0 / 5.0 + 32.0;
    let hi_f = 0.5 * (temp_f + 61.0 + (temp_f - 68.0) * 1.2 + humidity * 0.094);
    (hi_f - 32.0) * 5.0 / 9.0
}

/// Temperature sensor backed by a [`TemperatureSource`]
///
/// Valid samples feed the statistics aggregator; values outside
/// `[min_temp, max_temp]` are returned as invalid readings with an
/// `OutOfRange` fault and are left out of the statistics. Threshold
/// crossings only annotate the reading.
pub struct TemperatureSensor<S = SimulatedSource> {
    info: SensorInfo,
    config: TemperatureConfig,
    source: S,
    stats: StatisticsAggregator,
    derived: TemperatureSensorData,
    last: Option<(Instant, SensorReading)>,
    initialized: bool,
}

impl<S: TemperatureSource> TemperatureSensor<S> {
    /// Build an uninitialized sensor; call [`Sensor::initialize`] before reading
    pub fn new(id: &str, config: TemperatureConfig, source: S) -> Result<Self, SensorFault> {
        config.validate()?;
        let info = SensorInfo::new(id, SensorKind::Temperature)?
            .with_name("Temperature Sensor")
            .with_location("Factory Floor");

        Ok(Self {
            info,
            config,
            source,
            stats: StatisticsAggregator::new(),
            derived: TemperatureSensorData::default(),
            last: None,
            initialized: false,
        })
    }

    /// Read as if the current time were `now`
    pub fn read_at(&mut self, now: Instant) -> Result<SensorReading, SensorFault> {
        let result = self.sample_at(now);
        self.info.track(&result);
        result
    }

    fn sample_at(&mut self, now: Instant) -> Result<SensorReading, SensorFault> {
        if !self.initialized {
            return Err(SensorFault::InitFailed);
        }

        if let Some((taken_at, reading)) = &self.last {
            if now.saturating_duration_since(*taken_at) < self.config.sampling_period() {
                return Ok(reading.clone());
            }
        }

        let raw = self.source.sample(self.config.enable_humidity)?;
        let temperature = raw.temperature + self.config.calibration_offset;
        let humidity = raw
            .humidity
            .filter(|rh| self.config.enable_humidity && *rh > 0.0);

        self.derived = TemperatureSensorData {
            temperature,
            humidity,
            dew_point: humidity
                .filter(|_| self.config.enable_dew_point)
                .map(|rh| dew_point(temperature, rh)),
            heat_index: humidity
                .filter(|_| self.config.enable_heat_index)
                .map(|rh| heat_index(temperature, rh)),
        };

        let mut reading = SensorReading::new(SensorKind::Temperature, temperature, unix_now());
        if !temperature.is_finite()
            || temperature < self.config.min_temp
            || temperature > self.config.max_temp
        {
            debug!(
                "{}: {:.2}°C outside [{:.1}, {:.1}]",
                self.info.id, temperature, self.config.min_temp, self.config.max_temp
            );
            reading = reading.with_fault(SensorFault::OutOfRange);
        } else {
            let crossing = self.stats.observe(temperature, &self.config.thresholds());
            reading = reading.with_threshold(crossing.level());
        }

        self.last = Some((now, reading.clone()));
        Ok(reading)
    }

    pub fn stats(&self) -> Stats {
        self.stats.snapshot()
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    pub fn config(&self) -> &TemperatureConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TemperatureConfig) -> Result<(), SensorFault> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Humidity, dew point and heat index of the latest fresh sample
    pub fn last_derived(&self) -> TemperatureSensorData {
        self.derived
    }
}

impl<S: TemperatureSource> Sensor for TemperatureSensor<S> {
    fn info(&self) -> &SensorInfo {
        &self.info
    }

    fn initialize(&mut self) -> Result<(), SensorFault> {
        if let Err(fault) = self.source.initialize() {
            self.info.last_error = SensorFault::InitFailed;
            debug!("{}: source initialization failed: {}", self.info.id, fault);
            return Err(SensorFault::InitFailed);
        }
        self.initialized = true;
        self.info.last_error = SensorFault::None;
        Ok(())
    }

    fn read(&mut self) -> Result<SensorReading, SensorFault> {
        self.read_at(Instant::now())
    }

    fn cleanup(&mut self) {
        if self.initialized {
            self.source.shutdown();
            self.initialized = false;
        }
        self.last = None;
    }
}
