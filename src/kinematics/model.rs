// Wheel and string state of the plotter.
// String lengths are the source of truth; pen position and string angles are
// recomputed from them on every query.

use serde::Serialize;

use super::geometry::{require_positive, Geometry, KinematicsError, Result};

/// Index of the left wheel/string (pulley at the origin)
pub const LEFT: usize = 0;
/// Index of the right wheel/string (pulley at `(pulley_separation, 0)`)
pub const RIGHT: usize = 1;

/// A point in the pulley plane, in millimetres. `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Snapshot of everything a renderer needs for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub pen: Point,
    /// Angle of each string off its pulley's reference, in radians
    pub string_angles: [f64; 2],
    /// Cumulative rotation of each wheel, in radians
    pub wheel_angles: [f64; 2],
}

#[derive(Debug, Clone)]
pub struct KinematicModel {
    geometry: Geometry,
    wheel_angles: [f64; 2],
    string_lengths: [f64; 2],
    pending_distance: [f64; 2],
}

impl KinematicModel {
    /// Build a model with the pen hanging at `(start_x, start_y)` relative to
    /// the left pulley centre.
    pub fn new(geometry: Geometry, start_x: f64, start_y: f64) -> Result<Self> {
        if !start_x.is_finite() {
            return Err(KinematicsError::InvalidGeometry {
                parameter: "start offset x",
                value: start_x,
            });
        }
        let start_y = require_positive("start offset y", start_y)?;

        let left = start_x.hypot(start_y);
        let right = (geometry.pulley_separation() - start_x).hypot(start_y);

        Ok(Self {
            geometry,
            wheel_angles: [0.0; 2],
            string_lengths: [left, right],
            pending_distance: [0.0; 2],
        })
    }

    /// Validate raw dimensions and build the model in one step
    pub fn initialize(
        pulley_radius: f64,
        pulley_separation: f64,
        wheel_radius: f64,
        pulses_per_revolution: f64,
        start_offset_x: f64,
        start_offset_y: f64,
    ) -> Result<Self> {
        let geometry = Geometry::new(
            pulley_radius,
            pulley_separation,
            wheel_radius,
            pulses_per_revolution,
        )?;
        Self::new(geometry, start_offset_x, start_offset_y)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn radians_per_pulse(&self) -> f64 {
        self.geometry.radians_per_pulse()
    }

    pub fn string_lengths(&self) -> [f64; 2] {
        self.string_lengths
    }

    pub fn wheel_angles(&self) -> [f64; 2] {
        self.wheel_angles
    }

    /// Radians each wheel still has to turn for the motion in flight
    pub fn pending_distance(&self) -> [f64; 2] {
        self.pending_distance
    }

    /// Record the total rotation a new motion will distribute over its run
    pub fn begin_motion(&mut self, distance: [f64; 2]) {
        self.pending_distance = distance;
    }

    /// Drop whatever rotation is left of the current motion
    pub fn finish_motion(&mut self) {
        self.pending_distance = [0.0; 2];
    }

    /// Turn each wheel by `distance_per_fraction[i] * fraction_delta` radians
    /// and feed (or retract) the matching amount of string.
    ///
    /// `fraction_delta` must be the increment since the previous call so the
    /// deltas of one run sum to the full commanded distance.
    pub fn advance(&mut self, fraction_delta: f64, distance_per_fraction: [f64; 2]) {
        for i in [LEFT, RIGHT] {
            let delta = distance_per_fraction[i] * fraction_delta;
            self.wheel_angles[i] += delta;
            self.string_lengths[i] += self.geometry.wheel_radius() * delta;
            self.pending_distance[i] -= delta;
        }
    }

    /// Recompute pen position and string angles from the current string lengths
    ///
    /// # Errors
    /// `UnreachablePose` if the strings and the pulley separation cannot form
    /// a triangle.
    pub fn query_pose(&self) -> Result<Pose> {
        let r = self.geometry.pulley_radius();
        let d = self.geometry.pulley_separation();
        let s = self.string_lengths;

        // A string wound in past its anchor has no physical pose; the rim
        // wrap below would hide the sign
        if s.iter().any(|&len| !(len > 0.0)) {
            return Err(KinematicsError::UnreachablePose {
                cos_alpha: None,
                lengths: s,
            });
        }

        // Distance from each pulley centre to the pen, accounting for the
        // string leaving the pulley at its rim
        let l = s.map(|len| r.hypot(len));

        let cos_left = self.cos_alpha(l[LEFT], l[RIGHT], d)?;
        let cos_right = self.cos_alpha(l[RIGHT], l[LEFT], d)?;
        let alpha_left = cos_left.acos();
        let alpha_right = cos_right.acos();

        let pen = Point {
            x: cos_left * l[LEFT],
            y: alpha_left.sin() * l[LEFT],
        };

        Ok(Pose {
            pen,
            string_angles: [
                (r / s[LEFT]).atan() + alpha_left,
                (r / s[RIGHT]).atan() + alpha_right,
            ],
            wheel_angles: self.wheel_angles,
        })
    }

    /// Cosine of the angle at the pulley whose centre-to-pen distance is `near`
    fn cos_alpha(&self, near: f64, far: f64, separation: f64) -> Result<f64> {
        let cos_alpha = (near * near + separation * separation - far * far) / (2.0 * near * separation);
        // Negated comparison also rejects NaN
        if !(cos_alpha.abs() <= 1.0) {
            return Err(KinematicsError::UnreachablePose {
                cos_alpha: Some(cos_alpha),
                lengths: self.string_lengths,
            });
        }
        Ok(cos_alpha)
    }
}
