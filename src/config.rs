//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the rain-gauge.toml file.
//! It provides a centralized way to configure the sensor line, pulse timing, the
//! reporting period and where published values are written.

use crate::GaugeError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Default config file location, relative to the working directory
pub const CONFIG_FILE: &str = "rain-gauge.toml";

/// Application configuration loaded from rain-gauge.toml
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Rain sensor wiring and pulse timing
    pub sensor: SensorConfig,
    /// Reporting period
    pub reporting: ReportingConfig,
    /// Published value destination
    pub publish: PublishConfig,
}

/// Rain sensor wiring and pulse timing
#[derive(Debug, Deserialize, Serialize)]
pub struct SensorConfig {
    /// GPIO character device the relay is wired to
    pub gpio_chip: String,
    /// Line offset on that chip (BCM numbering on a Raspberry Pi)
    pub pin: u32,
    /// Relay closed time in microseconds that equals one drop
    pub pulse_unit_micros: u64,
    /// How often the relay line is polled, in milliseconds
    pub poll_interval_ms: u64,
}

/// Reporting configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct ReportingConfig {
    /// Seconds between two reports (one history slot per report)
    pub interval_secs: u64,
}

/// Published value destination
#[derive(Debug, Deserialize, Serialize)]
pub struct PublishConfig {
    /// Directory that receives one file per published value
    pub shm_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sensor: SensorConfig {
                gpio_chip: "/dev/gpiochip0".to_string(),
                pin: 8, // wiringPi pin 10
                pulse_unit_micros: crate::DEFAULT_PULSE_UNIT_MICROS,
                poll_interval_ms: crate::DEFAULT_POLL_INTERVAL_MS,
            },
            reporting: ReportingConfig {
                interval_secs: crate::DEFAULT_REPORT_INTERVAL_SECS,
            },
            publish: PublishConfig {
                shm_dir: "/dev/shm".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from rain-gauge.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(
                        chip = %config.sensor.gpio_chip,
                        pin = config.sensor.pin,
                        "loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    warn!(error = %e, "invalid config file format, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!("no config file found, using default configuration");
                Self::default()
            }
        }
    }

    /// Save current configuration to rain-gauge.toml
    pub fn save(&self) -> Result<(), GaugeError> {
        self.save_to_path(CONFIG_FILE)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), GaugeError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }

    /// Reject values that would divide by zero or spin the CPU
    pub fn validate(&self) -> Result<(), GaugeError> {
        if self.sensor.pulse_unit_micros == 0 {
            return Err(GaugeError::InvalidConfig(
                "sensor.pulse_unit_micros must be positive".to_string(),
            ));
        }
        if self.sensor.poll_interval_ms == 0 {
            return Err(GaugeError::InvalidConfig(
                "sensor.poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.reporting.interval_secs == 0 {
            return Err(GaugeError::InvalidConfig(
                "reporting.interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.sensor.poll_interval_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.reporting.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sensor.gpio_chip, "/dev/gpiochip0");
        assert_eq!(config.sensor.pulse_unit_micros, 190_000);
        assert_eq!(config.sensor.poll_interval_ms, 10);
        assert_eq!(config.reporting.interval_secs, 60);
        assert_eq!(config.publish.shm_dir, "/dev/shm");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.sensor.pin = 17;
        config.reporting.interval_secs = 30;

        config.save_to_path(file.path()).unwrap();
        let loaded = Config::load_from_path(file.path());

        assert_eq!(loaded.sensor.pin, 17);
        assert_eq!(loaded.reporting.interval_secs, 30);
        assert_eq!(loaded.report_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.sensor.pin, 8);
    }

    #[test]
    fn test_load_invalid_file_falls_back() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "[sensor]\npin = \"not a number\"\n").unwrap();

        let config = Config::load_from_path(file.path());
        assert_eq!(config.sensor.pulse_unit_micros, 190_000);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        config.sensor.pulse_unit_micros = 0;
        assert!(matches!(
            config.validate(),
            Err(GaugeError::InvalidConfig(_))
        ));

        let mut config = Config::default();
        config.sensor.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.reporting.interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
