//! Executes routines step by step.

use embassy_time::Duration;

use super::{Routine, RoutineError, Step};
use crate::utils::{
    config::RobotProfile,
    controllers::{
        line::TapeSeeker,
        motion::{self, MotionController, MotionOutcome},
        Robot,
    },
    hardware::{ColorSample, ColorSensor, DcMotor, OpModeHost, Servo},
};

/// Owns the motion state machines used while a routine runs.
pub struct RoutineRunner {
    pub motion: MotionController,
    pub seeker: TapeSeeker,
}

impl RoutineRunner {
    pub fn new(profile: &RobotProfile) -> Self {
        RoutineRunner {
            motion: MotionController::from_profile(profile),
            seeker: TapeSeeker::from_profile(profile),
        }
    }

    /// Run every step in order. Returns the number of steps completed.
    pub fn run<M, S, C, H>(
        &mut self,
        routine: &Routine,
        robot: &mut Robot<M, S, C>,
        host: &mut H,
    ) -> Result<usize, RoutineError>
    where
        M: DcMotor,
        S: Servo,
        C: ColorSensor,
        H: OpModeHost,
    {
        tracing::info!(steps = routine.len(), strict = routine.strict, "routine started");
        for (index, step) in routine.steps.iter().enumerate() {
            if !host.is_active() {
                tracing::warn!(step = index, "routine canceled before step");
                return Err(RoutineError::Canceled { step: index });
            }
            tracing::debug!(step = index, ?step, "executing");
            match self.execute(*step, robot, host) {
                MotionOutcome::Reached => {}
                MotionOutcome::Canceled => return Err(RoutineError::Canceled { step: index }),
                MotionOutcome::TimedOut if routine.strict => {
                    return Err(RoutineError::TimedOut { step: index })
                }
                MotionOutcome::TimedOut => {
                    tracing::warn!(step = index, "step timed out, continuing");
                }
            }
        }
        tracing::info!("routine complete");
        Ok(routine.len())
    }

    /// Execute a single step. Mechanism and timed steps always report `Reached`.
    pub fn execute<M, S, C, H>(
        &mut self,
        step: Step,
        robot: &mut Robot<M, S, C>,
        host: &mut H,
    ) -> MotionOutcome
    where
        M: DcMotor,
        S: Servo,
        C: ColorSensor,
        H: OpModeHost,
    {
        match step {
            Step::Drive { d, s } => self.motion.drive(robot, host, d, s),
            Step::Turn { a, s } => self.motion.turn(robot, host, a, s),
            Step::Strafe { dir, d, s } => self.motion.strafe_distance(robot, host, dir, d, s),
            Step::DriveForTime { s, ms } => {
                motion::drive_for_time(
                    &mut robot.drivetrain,
                    host,
                    s,
                    Duration::from_millis(u64::from(ms)),
                );
                MotionOutcome::Reached
            }
            Step::TurnForTime { dir, s, ms } => {
                motion::turn_for_time(
                    &mut robot.drivetrain,
                    host,
                    dir,
                    s,
                    Duration::from_millis(u64::from(ms)),
                );
                MotionOutcome::Reached
            }
            Step::StopAtTape { r, g, b, tol } => {
                self.seeker
                    .stop_at_tape(robot, host, ColorSample::new(r, g, b), tol)
            }
            Step::DropTow => {
                robot.mechanisms.drop_tow();
                MotionOutcome::Reached
            }
            Step::RaiseTow => {
                robot.mechanisms.raise_tow();
                MotionOutcome::Reached
            }
            Step::GrabBlock => {
                robot.mechanisms.grab_block();
                MotionOutcome::Reached
            }
            Step::ReleaseBlock => {
                robot.mechanisms.release_block();
                MotionOutcome::Reached
            }
            Step::MoveArm { level, s } => {
                robot.mechanisms.move_arm(level, s);
                MotionOutcome::Reached
            }
            Step::Sleep { ms } => {
                host.delay_ms(ms);
                MotionOutcome::Reached
            }
        }
    }
}
