// Message types for the runtime

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::kinematics::{Point, Pose};

/// Relative wheel motion, executed over time by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionCommand {
    /// Encoder pulses for [left, right]; positive feeds string out
    pub pulses: [i32; 2],
    pub speed_pulses_per_ms: f64,
}

impl MotionCommand {
    pub fn new(pulses: [i32; 2], speed_pulses_per_ms: f64) -> Self {
        Self {
            pulses,
            speed_pulses_per_ms,
        }
    }
}

/// Line protocol command, as sent over serial to the board:
/// `M <left> <right>`, `D <left> <right>` or `P <n>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardCommand {
    /// Move the wheels with the pen lifted
    Move { left: i16, right: i16 },
    /// Move the wheels with the pen on the board
    Draw { left: i16, right: i16 },
    /// Lower (`true`) or lift the pen without moving
    Pen(bool),
}

impl BoardCommand {
    /// Wheel pulses this command asks for, if it moves at all
    pub fn pulses(&self) -> Option<[i32; 2]> {
        match *self {
            BoardCommand::Move { left, right } | BoardCommand::Draw { left, right } => {
                Some([left.into(), right.into()])
            }
            BoardCommand::Pen(_) => None,
        }
    }

    /// Pen state this command leaves behind
    pub fn drawing(&self) -> bool {
        match *self {
            BoardCommand::Move { .. } => false,
            BoardCommand::Draw { .. } => true,
            BoardCommand::Pen(down) => down,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseCommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command {0:?}")]
    Unknown(String),

    #[error("Command {command} takes {expected} arguments, got {got}")]
    Arity {
        command: char,
        expected: usize,
        got: usize,
    },

    #[error("Invalid argument {arg:?}: {source}")]
    Argument {
        arg: String,
        #[source]
        source: ParseIntError,
    },
}

impl FromStr for BoardCommand {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next().ok_or(ParseCommandError::Empty)?;
        let command = match name {
            "M" | "m" => 'M',
            "D" | "d" => 'D',
            "P" | "p" => 'P',
            _ => return Err(ParseCommandError::Unknown(name.to_string())),
        };

        let args = tokens
            .map(|arg| {
                arg.parse::<i16>().map_err(|source| ParseCommandError::Argument {
                    arg: arg.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let expected = if command == 'P' { 1 } else { 2 };
        if args.len() != expected {
            return Err(ParseCommandError::Arity {
                command,
                expected,
                got: args.len(),
            });
        }

        Ok(match command {
            'M' => BoardCommand::Move {
                left: args[0],
                right: args[1],
            },
            'D' => BoardCommand::Draw {
                left: args[0],
                right: args[1],
            },
            _ => BoardCommand::Pen(args[0] != 0),
        })
    }
}

impl fmt::Display for BoardCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            BoardCommand::Move { left, right } => write!(f, "M {} {}", left, right),
            BoardCommand::Draw { left, right } => write!(f, "D {} {}", left, right),
            BoardCommand::Pen(down) => write!(f, "P {}", u8::from(down)),
        }
    }
}

/// Pose published to renderers every frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseReport {
    pub x: f64,
    pub y: f64,
    pub angle0: f64,
    pub angle1: f64,
    pub wheel_angle0: f64,
    pub wheel_angle1: f64,
}

impl From<&Pose> for PoseReport {
    fn from(pose: &Pose) -> Self {
        Self {
            x: pose.pen.x,
            y: pose.pen.y,
            angle0: pose.string_angles[0],
            angle1: pose.string_angles[1],
            wheel_angle0: pose.wheel_angles[0],
            wheel_angle1: pose.wheel_angles[1],
        }
    }
}

/// Published whenever a run starts or stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerStatus {
    pub running: bool,
}

/// Line drawn by the pen between two consecutive frames
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}
