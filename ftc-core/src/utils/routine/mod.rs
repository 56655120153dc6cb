//! Autonomous routines.
//!
//! A routine is a JSON list of [`Step`]s, tagged with `"st"`, executed in
//! order against the robot. For example:
//!
//! ```json
//! [
//!   { "st": "drive", "d": 24.0, "s": 1.0 },
//!   { "st": "drop_tow" },
//!   { "st": "sleep", "ms": 1000 },
//!   { "st": "turn", "a": 90.0, "s": 1.0 },
//!   { "st": "stop_at_tape", "r": 40, "g": 60, "b": 160, "tol": 25 }
//! ]
//! ```

pub mod runner;

use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::controllers::drivetrain::Direction;

pub use runner::RoutineRunner;

/// Errors that can occur when loading or running a routine.
#[derive(Debug)]
pub enum RoutineError {
    Parse(serde_json::Error),
    /// The opmode stopped while `step` was pending or running.
    Canceled { step: usize },
    /// Strict routines stop at the first primitive that times out.
    TimedOut { step: usize },
}

impl fmt::Display for RoutineError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            RoutineError::Parse(e) => write!(f, "routine is not valid JSON: {}", e),
            RoutineError::Canceled { step } => write!(f, "routine canceled at step {}", step),
            RoutineError::TimedOut { step } => write!(f, "routine timed out at step {}", step),
        }
    }
}

impl core::error::Error for RoutineError {}

impl From<serde_json::Error> for RoutineError {
    fn from(e: serde_json::Error) -> Self {
        RoutineError::Parse(e)
    }
}

/// One autonomous action.
///
/// Serialized as JSON with tag `"st"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "st", rename_all = "snake_case")]
pub enum Step {
    /// Closed-loop straight drive of `d` at speed `s`.
    Drive { d: f32, s: f32 },
    /// Closed-loop turn by `a` degrees at speed `s`.
    Turn { a: f32, s: f32 },
    /// Closed-loop strafe of `d` toward `dir`.
    Strafe { dir: Direction, d: f32, s: f32 },
    /// Open-loop straight drive for `ms`.
    DriveForTime { s: f32, ms: u32 },
    /// Open-loop turn toward `dir` for `ms`.
    TurnForTime { dir: Direction, s: f32, ms: u32 },
    /// Creep forward until the sensor sees `(r, g, b)` within `tol`.
    StopAtTape { r: i32, g: i32, b: i32, tol: i32 },
    DropTow,
    RaiseTow,
    GrabBlock,
    ReleaseBlock,
    MoveArm { level: i32, s: f32 },
    Sleep { ms: u32 },
}

/// An ordered list of steps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Routine {
    pub steps: Vec<Step>,
    /// Abort on the first timed-out primitive instead of carrying on.
    #[serde(default)]
    pub strict: bool,
}

impl Routine {
    pub fn new(steps: Vec<Step>) -> Self {
        Routine {
            steps,
            strict: false,
        }
    }

    /// Accepts either a bare step list or `{ "strict": .., "steps": [..] }`.
    pub fn from_json(json: &str) -> Result<Self, RoutineError> {
        let trimmed = json.trim_start();
        if trimmed.starts_with('[') {
            let steps: Vec<Step> = serde_json::from_str(trimmed)?;
            Ok(Routine::new(steps))
        } else {
            Ok(serde_json::from_str(trimmed)?)
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
