// Immutable device geometry, fixed when the model is constructed.

use std::f64::consts::TAU;

/// Error types for the kinematic model
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum KinematicsError {
    #[error("Invalid geometry: {parameter} must be positive, got {value}")]
    InvalidGeometry { parameter: &'static str, value: f64 },

    /// `cos_alpha` is `None` when a string length itself is not positive
    #[error("Unreachable pose for string lengths {lengths:?} (cosine {cos_alpha:?})")]
    UnreachablePose {
        cos_alpha: Option<f64>,
        lengths: [f64; 2],
    },
}

pub type Result<T> = std::result::Result<T, KinematicsError>;

/// Pulley and wheel dimensions, all in millimetres.
/// Only obtainable through [`Geometry::new`], so every instance is valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pulley_radius: f64,
    pulley_separation: f64,
    wheel_radius: f64,
    radians_per_pulse: f64,
}

impl Geometry {
    /// Validate the dimensions and derive the angular step of one motor pulse
    pub fn new(
        pulley_radius: f64,
        pulley_separation: f64,
        wheel_radius: f64,
        pulses_per_revolution: f64,
    ) -> Result<Self> {
        Ok(Self {
            pulley_radius: require_positive("pulley radius", pulley_radius)?,
            pulley_separation: require_positive("pulley separation", pulley_separation)?,
            wheel_radius: require_positive("wheel radius", wheel_radius)?,
            radians_per_pulse: TAU
                / require_positive("pulses per revolution", pulses_per_revolution)?,
        })
    }

    pub fn pulley_radius(&self) -> f64 {
        self.pulley_radius
    }

    /// Horizontal distance between the two pulley centres
    pub fn pulley_separation(&self) -> f64 {
        self.pulley_separation
    }

    /// String fed per radian of wheel rotation
    pub fn wheel_radius(&self) -> f64 {
        self.wheel_radius
    }

    pub fn radians_per_pulse(&self) -> f64 {
        self.radians_per_pulse
    }

    /// Convert a signed pulse count into wheel rotation in radians
    pub fn pulses_to_radians(&self, pulses: i32) -> f64 {
        pulses as f64 * self.radians_per_pulse
    }
}

/// Rejects zero, negative, NaN and infinite values
pub(crate) fn require_positive(parameter: &'static str, value: f64) -> Result<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(KinematicsError::InvalidGeometry { parameter, value })
    }
}
