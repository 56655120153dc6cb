//! Module Exports
//!
//! This file exports the controllers that move the robot.
//!
//! - `drivetrain`: tank/strafe/straight primitives over four wheel motors.
//! - `odometry`: encoder totals and distance conversion.
//! - `motion`: closed-loop drive/turn/strafe state machine.
//! - `line`: color-band tape detection and the stop-at-tape seeker.
//! - `mechanisms`: tow, grabber, arm and intake.
//! - `teleop`: the per-tick operator loop.

pub mod drivetrain;
pub mod line;
pub mod mechanisms;
pub mod motion;
pub mod odometry;
pub mod teleop;

pub use drivetrain::{Direction, DriveCommand, Drivetrain, Wheel};
pub use line::{ColorBand, TapeSeeker};
pub use mechanisms::Mechanisms;
pub use motion::{MotionController, MotionEvent, MotionOutcome, MotionPhase, MotionTarget};
pub use odometry::Odometer;
pub use teleop::TeleopLoop;

use crate::utils::{
    config::RobotProfile,
    hardware::{ColorSensor, DcMotor, Servo},
};

/// The robot's hardware context.
///
/// Built once by the opmode and handed by `&mut` to the motion primitives and
/// the teleop loop.
pub struct Robot<M, S, C> {
    pub drivetrain: Drivetrain<M>,
    pub odometer: Odometer,
    pub mechanisms: Mechanisms<M, S>,
    pub line_sensor: C,
    pub profile: RobotProfile,
}

impl<M, S, C> Robot<M, S, C>
where
    M: DcMotor,
    S: Servo,
    C: ColorSensor,
{
    /// Wire up the robot. `profile` defaults to [`RobotProfile::tow_bot`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        drivetrain: Drivetrain<M>,
        tow: M,
        arm: M,
        intake: Option<M>,
        grabber: S,
        arm_balancer: S,
        line_sensor: C,
        profile: Option<RobotProfile>,
    ) -> Self {
        let profile = profile.unwrap_or_default();
        let odometer = Odometer::new(profile.geometry);
        let mechanisms = Mechanisms::new(
            tow,
            arm,
            intake,
            grabber,
            arm_balancer,
            profile.mechanisms,
        );

        tracing::info!(
            ppr = profile.geometry.pulses_per_revolution,
            circumference = profile.geometry.wheel_circumference,
            settle_ms = profile.motion.settle_ms,
            "robot initialized"
        );

        Robot {
            drivetrain,
            odometer,
            mechanisms,
            line_sensor,
            profile,
        }
    }
}
