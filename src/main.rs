use std::time::Duration;
use tokio::sync::mpsc;
use zone_monitor::config::{self, Config};
use zone_monitor::events::{ZoneEvent, ZoneEventRecord, channel_callbacks};
use zone_monitor::monitor::ZoneMonitor;
use zone_monitor::sensor::RangingSensor;
use zone_monitor::sensor::vl53l1x::Vl53l1xSensor;

fn init_tracing(level: tracing::Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let config = config::load_from_path(&config_path)?;
    init_tracing(config.log_level());
    tracing::info!(config_path = %config_path, app = %config.app.name, "zone-monitor starting");

    let sensor = Vl53l1xSensor::new(None, config.i2c_address())?;
    let mut monitor = ZoneMonitor::new(sensor, config.update_interval(), config.certainty_factor());
    if !monitor.init() {
        return Err(format!(
            "VL53L1X initialization failed at {:#04x}",
            config.i2c_address()
        )
        .into());
    }
    apply_sensor_settings(&mut monitor, &config);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    for zone in config.zones() {
        let id = monitor.add_zone(zone.min_mm, zone.max_mm, None, None);
        let (on_enter, on_exit) = channel_callbacks(id, zone.name.clone(), events_tx.clone());
        if let Some(detector) = monitor.zone_by_id(id) {
            detector.set_on_enter(Some(on_enter));
            detector.set_on_exit(Some(on_exit));
        }
        tracing::info!(
            zone = %zone.name,
            %id,
            min_mm = zone.min_mm,
            max_mm = zone.max_mm,
            "Zone registered"
        );
    }
    drop(events_tx);
    if monitor.zone_count() == 0 {
        tracing::warn!("No zones configured in [[zones]]");
    }

    let printer = tokio::spawn(print_events(events_rx));
    run_tick_loop(&mut monitor, config.poll_interval()).await;

    // Dropping the monitor closes every callback sender and ends the printer.
    drop(monitor);
    printer.await?;
    tracing::info!("zone-monitor stopped");
    Ok(())
}

fn apply_sensor_settings<S: RangingSensor>(monitor: &mut ZoneMonitor<S>, config: &Config) {
    if let Some(mode) = config.distance_mode() {
        monitor.set_distance_mode(mode);
    }
    if let Some(budget_us) = config.timing_budget_us() {
        monitor.set_timing_budget(budget_us);
    }
    if let Some(timeout_ms) = config.timeout_ms() {
        monitor.set_timeout(timeout_ms);
    }
    tracing::info!(
        distance_mode = ?monitor.distance_mode(),
        timing_budget_us = ?monitor.timing_budget(),
        timeout_ms = ?monitor.timeout(),
        interval_ms = monitor.update_interval().as_millis(),
        certainty = monitor.certainty_factor(),
        "Sensor configured"
    );
}

/// Tick until Ctrl-C.
async fn run_tick_loop<S: RangingSensor>(monitor: &mut ZoneMonitor<S>, poll: Duration) {
    let mut ticker = tokio::time::interval(poll);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                monitor.tick();
            }
            result = &mut shutdown => {
                if let Err(err) = result {
                    tracing::warn!(error = %err, "Failed to listen for Ctrl-C");
                }
                break;
            }
        }
    }
}

async fn print_events(mut events: mpsc::UnboundedReceiver<ZoneEvent>) {
    while let Some(event) = events.recv().await {
        match ZoneEventRecord::from_event(&event).map(|record| record.to_json()) {
            Ok(Ok(line)) => println!("{line}"),
            Ok(Err(err)) => tracing::warn!(error = %err, "Failed to serialize zone event"),
            Err(err) => tracing::warn!(error = %err, "Failed to format event timestamp"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::config;

    #[test]
    fn default_config_is_valid_toml() -> Result<(), Box<dyn std::error::Error>> {
        let _config = config::load_default()?;
        Ok(())
    }
}
