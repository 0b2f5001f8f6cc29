use log::{error, info, warn};
use tokio::time::sleep;

use edgetrack::config::AppConfig;
use edgetrack::export::CsvExporter;
use edgetrack::logger::{LogLevel, Logger};
use edgetrack::sensor::{severity, Sensor, SimulatedSource, TemperatureSensor};
use edgetrack::stats::Stats;
use edgetrack::utils::{local_offset, now_in};
use time::UtcOffset;

fn print_sensor_stats(stats: &Stats) {
    let show = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}°C", v));

    println!("\nSensor Statistics:");
    println!("  Samples: {}", stats.sample_count);
    println!("  Min Value: {}", show(stats.min_value));
    println!("  Max Value: {}", show(stats.max_value));
    println!("  Average: {}", show(stats.mean_value));
    println!("  Alerts: {}", stats.alert_count);
    println!("  Critical: {}", stats.critical_count);
    println!("  Error Rate: {:.2}%", stats.critical_rate_percent());
}

async fn main_loop(
    config: &AppConfig,
    sensor: &mut TemperatureSensor,
    logger: &Logger,
    csv: &mut CsvExporter,
) {
    let mut sample_count: u64 = 0;
    let sensor_id = sensor.info().id.clone();
    let kind_name = sensor.info().kind.name();
    let utc_offset = logger.utc_offset();

    loop {
        match sensor.read() {
            Ok(reading) => {
                print!(
                    "Temperature: {:.2}{} (Valid: {})",
                    reading.value,
                    reading.unit(),
                    if reading.is_valid { "Yes" } else { "No" }
                );
                if !reading.is_valid {
                    print!(" [WARNING: {}]", reading.fault);
                }
                println!();

                logger.log_reading(&sensor_id, kind_name, &reading, severity(&reading));

                if let Err(e) = csv.append(&sensor_id, kind_name, &reading, &now_in(utc_offset)) {
                    error!("CSV export failed: {}", e);
                }

                sample_count += 1;
                if sample_count % config.stats_every == 0 {
                    print_sensor_stats(&sensor.stats());
                }
            }
            Err(fault) => {
                warn!("Error reading temperature sensor {}: {}", sensor_id, fault);
                logger.log(
                    LogLevel::Error,
                    &format!("Sensor {} read failed: {}", sensor_id, fault),
                );
            }
        }

        sleep(config.sample_interval).await;
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The local offset is only readable before the runtime spawns threads
    let utc_offset = local_offset();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(utc_offset))
}

async fn run(utc_offset: UtcOffset) -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = AppConfig::new()?;

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(config.logger.minimum_level.into())
        .format_timestamp_secs()
        .init();

    println!("Industrial AI-Powered Edge Monitoring System\n");

    let logger = Logger::new().with_utc_offset(utc_offset);
    if let Err(e) = logger.init(config.logger.clone()) {
        error!("Failed to initialize logger: {}", e);
        return Err(e.into());
    }

    let mut csv = match CsvExporter::create(&config.csv_path) {
        Ok(csv) => csv,
        Err(e) => {
            error!("Could not open CSV file: {}", e);
            logger.teardown();
            return Err(e.into());
        }
    };

    let mut temp_sensor = TemperatureSensor::new(
        &config.sensor_id,
        config.temperature.clone(),
        SimulatedSource::new(),
    )?;
    if let Err(fault) = temp_sensor.initialize() {
        error!("Failed to initialize temperature sensor: {}", fault);
        logger.teardown();
        return Err(fault.into());
    }

    let t = &config.temperature;
    info!("Temperature sensor {} initialized", config.sensor_id);
    info!("  Valid range: {:.1}°C to {:.1}°C", t.min_temp, t.max_temp);
    info!("  Alert threshold: {:.1}°C", t.alert_threshold);
    info!("  Critical threshold: {:.1}°C", t.critical_threshold);
    info!("  Sampling rate: {} ms", t.sampling_rate_ms);
    info!(
        "  Humidity: {}, dew point: {}, heat index: {}",
        t.enable_humidity, t.enable_dew_point, t.enable_heat_index
    );
    println!("Starting monitoring loop... (Press Ctrl+C to stop)\n");

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(());
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    // Run main loop or wait for shutdown signal
    tokio::select! {
        _ = main_loop(&config, &mut temp_sensor, &logger, &mut csv) => {}
        _ = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    println!("\nShutting down...");
    print_sensor_stats(&temp_sensor.stats());

    temp_sensor.cleanup();
    logger.teardown();

    Ok(())
}
