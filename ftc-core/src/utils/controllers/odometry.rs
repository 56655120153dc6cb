//! Encoder odometry.
//!
//! The motor controllers zero their encoders on every reset, so the odometer
//! folds each pre-reset reading into a cumulative per-wheel total. Progress
//! metrics for the motion primitives are computed from the raw (post-reset)
//! counts.

use crate::utils::{
    self,
    controllers::drivetrain::Drivetrain,
    hardware::{DcMotor, RunMode},
    math::encoders::EncoderSnapshot,
};

pub struct Odometer {
    totals: [i64; 4],
    geometry: utils::geometry,
}

impl Odometer {
    pub fn new(geometry: utils::geometry) -> Self {
        Odometer {
            totals: [0; 4],
            geometry,
        }
    }

    pub fn geometry(&self) -> &utils::geometry {
        &self.geometry
    }

    /// Current raw counts of the four wheels.
    pub fn snapshot<M: DcMotor>(
        &self,
        drivetrain: &Drivetrain<M>,
    ) -> EncoderSnapshot {
        EncoderSnapshot::new(drivetrain.positions())
    }

    /// Fold the current raw counts into the totals, then zero the hardware
    /// counters and resume counting.
    pub fn reset_encoders<M: DcMotor>(
        &mut self,
        drivetrain: &mut Drivetrain<M>,
    ) {
        let raw = drivetrain.positions();
        for (total, &ticks) in self.totals.iter_mut().zip(raw.iter()) {
            *total += i64::from(ticks);
        }
        drivetrain.set_mode(RunMode::StopAndResetEncoder);
        drivetrain.set_mode(RunMode::RunUsingEncoder);
        tracing::debug!(?raw, totals = ?self.totals, "encoders reset");
    }

    /// Totals as of the last reset.
    pub fn totals(&self) -> [i64; 4] {
        self.totals
    }

    /// Totals including the ticks counted since the last reset.
    pub fn cumulative<M: DcMotor>(
        &self,
        drivetrain: &Drivetrain<M>,
    ) -> [i64; 4] {
        let raw = drivetrain.positions();
        let mut out = self.totals;
        for (total, &ticks) in out.iter_mut().zip(raw.iter()) {
            *total += i64::from(ticks);
        }
        out
    }

    /// Mean absolute raw count; turn progress.
    pub fn average_encoder<M: DcMotor>(
        &self,
        drivetrain: &Drivetrain<M>,
    ) -> f32 {
        self.snapshot(drivetrain).average_encoder()
    }

    /// Signed mean raw count; straight-line progress.
    pub fn drive_average<M: DcMotor>(
        &self,
        drivetrain: &Drivetrain<M>,
    ) -> f32 {
        self.snapshot(drivetrain).drive_average()
    }

    /// Distance covered since the last reset, from [`Self::drive_average`].
    pub fn calculate_distance<M: DcMotor>(
        &self,
        drivetrain: &Drivetrain<M>,
    ) -> f32 {
        self.geometry
            .ticks_to_distance(self.drive_average(drivetrain))
    }

    /// Distance covered since an earlier [`Self::calculate_distance`] reading.
    pub fn distance_since<M: DcMotor>(
        &self,
        drivetrain: &Drivetrain<M>,
        start: f32,
    ) -> f32 {
        self.calculate_distance(drivetrain) - start
    }

    pub fn distance_to_ticks(
        &self,
        distance: f32,
    ) -> f32 {
        self.geometry.distance_to_ticks(distance)
    }

    pub fn degrees_to_ticks(
        &self,
        degrees: f32,
    ) -> f32 {
        self.geometry.degrees_to_ticks(degrees)
    }
}
