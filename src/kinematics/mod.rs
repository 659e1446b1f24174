// Kinematic model for the two-pulley whiteboard plotter
//
// Provides:
// - Device geometry (pulleys, wheels, pulse resolution) with validation
// - Wheel rotation -> string length bookkeeping
// - String lengths -> pen position and string angles (law of cosines)

mod geometry;
pub mod model;

pub use geometry::{Geometry, KinematicsError, Result};
pub use model::{KinematicModel, Point, Pose, LEFT, RIGHT};
