//! Utility re-exports for the FTC robot core.
//!
//! - `hardware`: traits for motors, servos, the color sensor and the opmode host
//! - `controllers`: drivetrain, odometry, motion primitives, line stop and teleop
//! - `math`: encoder averaging and tick/distance conversions
//! - `input`: gamepad state and the edge-detecting debouncer
//! - `config`: named robot profiles and their validation
//! - `routine`: JSON autonomous step lists and their runner

pub mod config;
pub mod controllers;
pub mod hardware;
pub mod input;
pub mod math;
pub mod routine;

pub use config::{ProfileName, RobotProfile};
pub use controllers::Robot;
pub use embassy_time::{Duration, Instant};
pub use math::encoders::WheelGeometry as geometry;
