use crate::monitor::{DEFAULT_CERTAINTY_FACTOR, DEFAULT_UPDATE_INTERVAL};
use crate::sensor::{DEFAULT_I2C_ADDRESS_7BIT, DistanceMode, I2C_7BIT_MAX};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub sensor: Option<SensorSection>,
    #[serde(default)]
    pub zones: Vec<ZoneSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SensorSection {
    /// 7-bit I2C address (default: 0x29)
    pub i2c_address: Option<u8>,
    /// Minimum spacing between samples in milliseconds (default: 50)
    pub interval_ms: Option<u64>,
    /// Consecutive same-side samples needed to confirm a transition (default: 1)
    pub certainty: Option<usize>,
    pub distance_mode: Option<DistanceMode>,
    pub timing_budget_us: Option<u32>,
    pub timeout_ms: Option<u16>,
    /// How often the host loop calls tick (default: 10)
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ZoneSection {
    pub name: String,
    pub min_mm: u16,
    pub max_mm: u16,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor.as_ref().and_then(|s| s.interval_ms) == Some(0) {
            return Err(ConfigError::Invalid(
                "sensor.interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.i2c_address() > I2C_7BIT_MAX {
            return Err(ConfigError::Invalid(format!(
                "sensor.i2c_address {:#04x} exceeds 7-bit range",
                self.i2c_address()
            )));
        }
        for zone in &self.zones {
            if zone.min_mm > zone.max_mm {
                return Err(ConfigError::Invalid(format!(
                    "zone {:?}: min_mm {} exceeds max_mm {}",
                    zone.name, zone.min_mm, zone.max_mm
                )));
            }
        }
        Ok(())
    }

    fn sensor_section(&self) -> SensorSection {
        self.sensor.clone().unwrap_or_default()
    }

    /// Returns the configured log level, falling back to INFO when unparseable.
    pub fn log_level(&self) -> tracing::Level {
        self.logging.level.parse().unwrap_or(tracing::Level::INFO)
    }

    pub fn i2c_address(&self) -> u8 {
        self.sensor_section()
            .i2c_address
            .unwrap_or(DEFAULT_I2C_ADDRESS_7BIT)
    }

    /// Returns the sample interval (default: 50ms)
    pub fn update_interval(&self) -> Duration {
        self.sensor_section()
            .interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_UPDATE_INTERVAL)
    }

    pub fn certainty_factor(&self) -> usize {
        self.sensor_section()
            .certainty
            .unwrap_or(DEFAULT_CERTAINTY_FACTOR)
    }

    pub fn distance_mode(&self) -> Option<DistanceMode> {
        self.sensor_section().distance_mode
    }

    pub fn timing_budget_us(&self) -> Option<u32> {
        self.sensor_section().timing_budget_us
    }

    pub fn timeout_ms(&self) -> Option<u16> {
        self.sensor_section().timeout_ms
    }

    /// Returns the host tick period (default: 10ms)
    pub fn poll_interval(&self) -> Duration {
        let millis = self
            .sensor_section()
            .poll_interval_ms
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        Duration::from_millis(millis.max(1))
    }

    pub fn zones(&self) -> &[ZoneSection] {
        &self.zones
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn write_temp_config(
        tag: &str,
        contents: &str,
    ) -> Result<std::path::PathBuf, Box<dyn std::error::Error>> {
        let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        let path = std::env::temp_dir().join(format!("zone-monitor-{tag}-{unique}.toml"));
        fs::write(&path, contents)?;
        Ok(path)
    }

    #[test]
    fn default_config_declares_zones() -> Result<(), Box<dyn std::error::Error>> {
        let config = load_default()?;
        assert!(!config.zones().is_empty());
        Ok(())
    }

    #[test]
    fn missing_sensor_section_uses_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp_config(
            "minimal",
            r#"
[app]
name = "zone-monitor"

[logging]
level = "debug"
"#,
        )?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);
        let config = result?;

        assert_eq!(config.i2c_address(), 0x29);
        assert_eq!(config.update_interval(), Duration::from_millis(50));
        assert_eq!(config.certainty_factor(), 1);
        assert_eq!(config.distance_mode(), None);
        assert_eq!(config.poll_interval(), Duration::from_millis(10));
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
        assert!(config.zones().is_empty());
        Ok(())
    }

    #[test]
    fn sensor_and_zones_are_parsed() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp_config(
            "full",
            r#"
[app]
name = "zone-monitor"

[logging]
level = "info"

[sensor]
i2c_address = 0x30
interval_ms = 100
certainty = 4
distance_mode = "short"
timing_budget_us = 33000
timeout_ms = 250

[[zones]]
name = "near"
min_mm = 40
max_mm = 300

[[zones]]
name = "far"
min_mm = 250
max_mm = 1200
"#,
        )?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);
        let config = result?;

        assert_eq!(config.i2c_address(), 0x30);
        assert_eq!(config.update_interval(), Duration::from_millis(100));
        assert_eq!(config.certainty_factor(), 4);
        assert_eq!(config.distance_mode(), Some(DistanceMode::Short));
        assert_eq!(config.timing_budget_us(), Some(33_000));
        assert_eq!(config.timeout_ms(), Some(250));
        assert_eq!(
            config.zones()[1],
            ZoneSection {
                name: "far".to_string(),
                min_mm: 250,
                max_mm: 1200,
            }
        );
        Ok(())
    }

    #[test]
    fn inverted_zone_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp_config(
            "inverted",
            r#"
[app]
name = "zone-monitor"

[logging]
level = "info"

[[zones]]
name = "broken"
min_mm = 500
max_mm = 100
"#,
        )?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
        Ok(())
    }

    #[test]
    fn zero_interval_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp_config(
            "zero-interval",
            r#"
[app]
name = "zone-monitor"

[logging]
level = "info"

[sensor]
interval_ms = 0
"#,
        )?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
        Ok(())
    }

    #[test]
    fn missing_config_file_returns_read_error() {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("zone-monitor-missing-{unique}.toml"));

        let result = load_from_path(&path);

        assert!(matches!(result, Err(ConfigError::Read(_))));
    }

    #[test]
    fn invalid_toml_returns_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp_config("invalid", "not = [valid")?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        Ok(())
    }
}
