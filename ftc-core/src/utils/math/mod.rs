//! Math utilities for the FTC robot.
//!
//! This module provides encoder averaging and tick/distance/angle conversions
//! for a four-wheel drivetrain.

pub mod encoders;
