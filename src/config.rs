// Tick rate, motion speed, topics and device geometry
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::kinematics::{Geometry, KinematicModel, KinematicsError};

// Scheduler tick period (real time between animation steps)
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(30);

// Motion speed in pulses per millisecond
pub const DEFAULT_SPEED: f64 = 200.0 / 1000.0;

// Zenoh topics
pub const TOPIC_CMD: &str = "whiteboard/cmd"; // text commands ("M 100 -50")
pub const TOPIC_POSE: &str = "whiteboard/state/pose"; // pen pose per frame
pub const TOPIC_RUNNING: &str = "whiteboard/state/running"; // run/idle transitions
pub const TOPIC_SEGMENT: &str = "whiteboard/state/segment"; // drawn line segments

/// Error types for loading the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Geometry(#[from] KinematicsError),
}

/// Physical dimensions of the board, in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub pulley_radius: f64,
    pub pulley_separation: f64,
    pub wheel_radius: f64,
    /// Encoder pulses per wheel revolution (both edges counted)
    pub pulses_per_revolution: f64,
    /// Initial pen offset from the left pulley centre
    pub start_x: f64,
    pub start_y: f64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            pulley_radius: 10.0,
            pulley_separation: 500.0,
            wheel_radius: 10.0,
            pulses_per_revolution: 280.0,
            start_x: 250.0,
            start_y: 250.0,
        }
    }
}

impl DeviceConfig {
    pub fn geometry(&self) -> Result<Geometry, KinematicsError> {
        Geometry::new(
            self.pulley_radius,
            self.pulley_separation,
            self.wheel_radius,
            self.pulses_per_revolution,
        )
    }

    pub fn build_model(&self) -> Result<KinematicModel, KinematicsError> {
        KinematicModel::new(self.geometry()?, self.start_x, self.start_y)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub device: DeviceConfig,
    pub tick_period_ms: u64,
    pub speed_pulses_per_ms: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            tick_period_ms: DEFAULT_TICK_PERIOD.as_millis() as u64,
            speed_pulses_per_ms: DEFAULT_SPEED,
        }
    }
}

impl SimConfig {
    /// Read a JSON config file; absent fields keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the device can be built from this config
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.device.build_model()?;
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_period(), DEFAULT_TICK_PERIOD);
        assert_eq!(config.speed_pulses_per_ms, 0.2);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            SimConfig::from_json(r#"{ "device": { "pulley_separation": 800.0 }, "tick_period_ms": 15 }"#)
                .unwrap();
        assert_eq!(config.device.pulley_separation, 800.0);
        assert_eq!(config.device.wheel_radius, DeviceConfig::default().wheel_radius);
        assert_eq!(config.tick_period(), Duration::from_millis(15));
        assert_eq!(config.speed_pulses_per_ms, DEFAULT_SPEED);
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let err = SimConfig::from_json(r#"{ "device": { "wheel_radius": -2.0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Geometry(KinematicsError::InvalidGeometry { parameter: "wheel radius", .. })
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            SimConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            SimConfig::load("/nonexistent/whiteboard.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
