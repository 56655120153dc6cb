//! Encoder utilities for four-wheel drivetrains.
//!
//! `EncoderSnapshot` holds one reading of the four wheel encoders and offers the
//! two averaging policies used by the motion primitives. `WheelGeometry` turns
//! ticks into distance and back, and angles into tick ceilings.
//!
//! # Example
//! ```rust
//! use ftc_core::utils::math::encoders::{EncoderSnapshot, WheelGeometry};
//! let geometry = WheelGeometry::new(1120.0, 12.566, 12.0);
//! let snapshot = EncoderSnapshot::new([1120, 1120, 1120, 1120]);
//! let inches = geometry.ticks_to_distance(snapshot.drive_average());
//! ```
//!
use serde::{Deserialize, Serialize};

/// Raw tick counts of the four wheel encoders at one instant.
///
/// Order: front-left, front-right, back-left, back-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncoderSnapshot {
    pub ticks: [i32; 4],
}

impl EncoderSnapshot {
    pub fn new(ticks: [i32; 4]) -> Self {
        Self { ticks }
    }

    /// Mean of the absolute tick counts.
    ///
    /// Direction-agnostic, which is what a turn needs: both sides move, but in
    /// opposite directions.
    pub fn average_encoder(&self) -> f32 {
        let sum: i64 = self.ticks.iter().map(|&t| i64::from(t).abs()).sum();
        sum as f32 / 4.0
    }

    /// Signed mean of the tick counts, used for straight-line travel.
    pub fn drive_average(&self) -> f32 {
        let sum: i64 = self.ticks.iter().map(|&t| i64::from(t)).sum();
        sum as f32 / 4.0
    }

    /// Largest absolute tick count of any wheel.
    pub fn max_magnitude(&self) -> u32 {
        self.ticks
            .iter()
            .map(|t| t.unsigned_abs())
            .max()
            .unwrap_or(0)
    }
}

/// Drivetrain geometry for encoder conversions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelGeometry {
    /// Encoder pulses per wheel revolution.
    pub pulses_per_revolution: f32,
    /// Wheel circumference, in whatever distance unit the caller drives in.
    pub wheel_circumference: f32,
    /// Average encoder ticks per degree of in-place rotation ("degppr").
    pub degrees_to_ticks: f32,
}

impl WheelGeometry {
    pub const fn new(
        pulses_per_revolution: f32,
        wheel_circumference: f32,
        degrees_to_ticks: f32,
    ) -> Self {
        Self {
            pulses_per_revolution,
            wheel_circumference,
            degrees_to_ticks,
        }
    }

    /// `(ticks / pulses_per_revolution) * wheel_circumference`
    pub fn ticks_to_distance(
        &self,
        ticks: f32,
    ) -> f32 {
        (ticks / self.pulses_per_revolution) * self.wheel_circumference
    }

    /// Tick ceiling for a linear distance. Sign is dropped.
    pub fn distance_to_ticks(
        &self,
        distance: f32,
    ) -> f32 {
        libm::fabsf(distance) / self.wheel_circumference * self.pulses_per_revolution
    }

    /// Tick ceiling for an in-place rotation. Sign is dropped.
    pub fn degrees_to_ticks(
        &self,
        degrees: f32,
    ) -> f32 {
        libm::fabsf(degrees) * self.degrees_to_ticks
    }
}

/// `-1.0`, `0.0` or `1.0` following the sign of `v`.
pub(crate) fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}
