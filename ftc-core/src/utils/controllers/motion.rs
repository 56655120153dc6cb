//! Closed-loop motion primitives.
//!
//! `MotionController` runs one primitive at a time as a state machine:
//!
//! ```text
//! Idle -> Executing -> Settling -> Done(outcome)
//!            \______________________/  (cancel skips settling)
//! ```
//!
//! `tick` advances it by one polling iteration and never blocks, so an opmode
//! can drive it from its own loop. `drive`, `turn` and `strafe_distance` are the
//! blocking wrappers: they tick, then yield one host polling interval, until the
//! primitive is done.
//!
//! Every iteration re-checks the host's active flag. A cancel stops all four
//! wheels on that iteration and skips the settling pause.

use embassy_sync::{blocking_mutex::raw::NoopRawMutex, channel::Channel};
use embassy_time::{Duration, Instant};

use crate::utils::{
    config::{MotionConfig, RobotProfile},
    controllers::{
        drivetrain::{Direction, Drivetrain, Wheel},
        Robot,
    },
    hardware::{ColorSensor, DcMotor, OpModeHost, Servo, ZeroPowerBehavior},
    math::encoders::{sign, EncoderSnapshot},
};

const EVENT_DEPTH: usize = 8;

/// What a primitive is asked to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionTarget {
    /// Straight line. `speed` should carry the same sign as `distance`.
    Distance { distance: f32, speed: f32 },
    /// In-place rotation; positive is clockwise (left side forward).
    Angle { degrees: f32, speed: f32 },
    /// Lateral travel.
    Strafe {
        direction: Direction,
        distance: f32,
        speed: f32,
    },
}

/// How a primitive ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    Reached,
    Canceled,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPhase {
    Idle,
    Executing,
    Settling,
    Done(MotionOutcome),
}

/// Phase changes, published on the controller's event channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionEvent {
    Started(MotionTarget),
    Settling(MotionOutcome),
    Finished(MotionOutcome),
}

#[derive(Debug, Clone, Copy)]
struct ActiveMotion {
    target: MotionTarget,
    /// Per-wheel tick ceiling.
    ceiling: f32,
    started: Instant,
    restore: ZeroPowerBehavior,
    outcome: MotionOutcome,
    settle_until: Instant,
}

pub struct MotionController {
    config: MotionConfig,
    phase: MotionPhase,
    active: Option<ActiveMotion>,
    events: Channel<NoopRawMutex, MotionEvent, EVENT_DEPTH>,
}

impl MotionController {
    pub fn new(config: MotionConfig) -> Self {
        MotionController {
            config,
            phase: MotionPhase::Idle,
            active: None,
            events: Channel::new(),
        }
    }

    pub fn from_profile(profile: &RobotProfile) -> Self {
        Self::new(profile.motion)
    }

    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, MotionPhase::Executing | MotionPhase::Settling)
    }

    /// Tick ceiling of the running primitive.
    pub fn ceiling(&self) -> Option<f32> {
        self.active.map(|a| a.ceiling)
    }

    /// Pop the oldest unread phase event.
    pub fn next_event(&self) -> Option<MotionEvent> {
        self.events.try_receive().ok()
    }

    /// Start a primitive: brake on zero power, reset encoders, compute the tick
    /// ceiling and command the wheels.
    pub fn begin<M, S, C>(
        &mut self,
        robot: &mut Robot<M, S, C>,
        target: MotionTarget,
        now: Instant,
    ) where
        M: DcMotor,
        S: Servo,
        C: ColorSensor,
    {
        if let Some(previous) = self.active.take() {
            tracing::warn!(?previous.target, "motion replaced before it finished");
            robot.drivetrain.stop_moving();
            robot.drivetrain.set_zero_power_behavior(previous.restore);
        }

        let restore = robot.drivetrain.zero_power_behavior();
        robot.drivetrain.set_zero_power_behavior(ZeroPowerBehavior::Brake);
        robot.odometer.reset_encoders(&mut robot.drivetrain);

        let ceiling = match target {
            MotionTarget::Distance { distance, speed } => {
                robot.drivetrain.set_powers(speed);
                robot.odometer.distance_to_ticks(distance)
            }
            MotionTarget::Angle { degrees, speed } => {
                if degrees >= 0.0 {
                    robot.drivetrain.tank(speed, -speed);
                } else {
                    robot.drivetrain.tank(-speed, speed);
                }
                robot.odometer.degrees_to_ticks(degrees)
            }
            MotionTarget::Strafe {
                direction,
                distance,
                speed,
            } => {
                robot.drivetrain.strafe(direction, libm::fabsf(speed));
                robot.odometer.distance_to_ticks(distance)
            }
        };

        tracing::info!(?target, ceiling, "motion started");

        self.active = Some(ActiveMotion {
            target,
            ceiling,
            started: now,
            restore,
            outcome: MotionOutcome::Reached,
            settle_until: now,
        });
        self.phase = MotionPhase::Executing;
        self.publish(MotionEvent::Started(target));
    }

    /// Advance the running primitive by one polling iteration.
    pub fn tick<M, S, C, H>(
        &mut self,
        robot: &mut Robot<M, S, C>,
        host: &mut H,
    ) -> MotionPhase
    where
        M: DcMotor,
        S: Servo,
        C: ColorSensor,
        H: OpModeHost,
    {
        let Some(active) = self.active else {
            return self.phase;
        };

        match self.phase {
            MotionPhase::Executing => {
                if !host.is_active() {
                    tracing::warn!(?active.target, "motion canceled");
                    return self.finish(robot, active, MotionOutcome::Canceled);
                }

                let snapshot = robot.odometer.snapshot(&robot.drivetrain);
                let travelled = robot
                    .odometer
                    .geometry()
                    .ticks_to_distance(snapshot.drive_average());
                report(host, &active, &snapshot, travelled);

                if reached(&active, &snapshot, travelled) {
                    return self.settle(robot, host.now(), active, MotionOutcome::Reached);
                }

                if let Some(timeout) = self.config.timeout() {
                    if host.now() >= active.started + timeout {
                        tracing::warn!(
                            ?active.target,
                            peak = snapshot.max_magnitude(),
                            "motion timed out"
                        );
                        return self.settle(robot, host.now(), active, MotionOutcome::TimedOut);
                    }
                }

                enforce_ceiling(&mut robot.drivetrain, &snapshot, active.ceiling);
                self.phase
            }
            MotionPhase::Settling => {
                if !host.is_active() {
                    return self.finish(robot, active, MotionOutcome::Canceled);
                }
                if host.now() >= active.settle_until {
                    return self.finish(robot, active, active.outcome);
                }
                self.phase
            }
            phase => phase,
        }
    }

    /// Run `target` to completion, polling at the host's cadence.
    pub fn run<M, S, C, H>(
        &mut self,
        robot: &mut Robot<M, S, C>,
        host: &mut H,
        target: MotionTarget,
    ) -> MotionOutcome
    where
        M: DcMotor,
        S: Servo,
        C: ColorSensor,
        H: OpModeHost,
    {
        self.begin(robot, target, host.now());
        loop {
            if let MotionPhase::Done(outcome) = self.tick(robot, host) {
                return outcome;
            }
            host.idle();
        }
    }

    /// Drive straight until `distance` is covered.
    #[tracing::instrument(level = "debug", skip(self, robot, host))]
    pub fn drive<M, S, C, H>(
        &mut self,
        robot: &mut Robot<M, S, C>,
        host: &mut H,
        distance: f32,
        speed: f32,
    ) -> MotionOutcome
    where
        M: DcMotor,
        S: Servo,
        C: ColorSensor,
        H: OpModeHost,
    {
        self.run(robot, host, MotionTarget::Distance { distance, speed })
    }

    /// Turn in place by `degrees`; the sign picks the direction.
    #[tracing::instrument(level = "debug", skip(self, robot, host))]
    pub fn turn<M, S, C, H>(
        &mut self,
        robot: &mut Robot<M, S, C>,
        host: &mut H,
        degrees: f32,
        speed: f32,
    ) -> MotionOutcome
    where
        M: DcMotor,
        S: Servo,
        C: ColorSensor,
        H: OpModeHost,
    {
        self.run(robot, host, MotionTarget::Angle { degrees, speed })
    }

    #[tracing::instrument(level = "debug", skip(self, robot, host))]
    pub fn strafe_distance<M, S, C, H>(
        &mut self,
        robot: &mut Robot<M, S, C>,
        host: &mut H,
        direction: Direction,
        distance: f32,
        speed: f32,
    ) -> MotionOutcome
    where
        M: DcMotor,
        S: Servo,
        C: ColorSensor,
        H: OpModeHost,
    {
        self.run(
            robot,
            host,
            MotionTarget::Strafe {
                direction,
                distance,
                speed,
            },
        )
    }

    fn settle<M, S, C>(
        &mut self,
        robot: &mut Robot<M, S, C>,
        now: Instant,
        mut active: ActiveMotion,
        outcome: MotionOutcome,
    ) -> MotionPhase
    where
        M: DcMotor,
        S: Servo,
        C: ColorSensor,
    {
        let settle = self.config.settle();
        if settle.as_ticks() == 0 {
            return self.finish(robot, active, outcome);
        }

        robot.drivetrain.stop_moving();
        active.outcome = outcome;
        active.settle_until = now + settle;
        self.active = Some(active);
        self.phase = MotionPhase::Settling;
        tracing::debug!(?outcome, settle_ms = settle.as_millis(), "settling");
        self.publish(MotionEvent::Settling(outcome));
        self.phase
    }

    fn finish<M, S, C>(
        &mut self,
        robot: &mut Robot<M, S, C>,
        active: ActiveMotion,
        outcome: MotionOutcome,
    ) -> MotionPhase
    where
        M: DcMotor,
        S: Servo,
        C: ColorSensor,
    {
        robot.drivetrain.stop_moving();
        robot.drivetrain.set_zero_power_behavior(active.restore);
        self.active = None;
        self.phase = MotionPhase::Done(outcome);
        tracing::info!(?active.target, ?outcome, "motion finished");
        self.publish(MotionEvent::Finished(outcome));
        self.phase
    }

    fn publish(
        &self,
        event: MotionEvent,
    ) {
        if self.events.try_send(event).is_err() {
            // Full: drop the oldest so the latest phase is always readable.
            let _ = self.events.try_receive();
            let _ = self.events.try_send(event);
        }
    }
}

fn reached(
    active: &ActiveMotion,
    snapshot: &EncoderSnapshot,
    travelled: f32,
) -> bool {
    match active.target {
        MotionTarget::Distance { distance, .. } => {
            travelled * sign(distance) >= libm::fabsf(distance)
        }
        MotionTarget::Angle { .. } | MotionTarget::Strafe { .. } => {
            snapshot.average_encoder() >= active.ceiling
        }
    }
}

/// Zero any wheel that has run past the ceiling while the others catch up.
fn enforce_ceiling<M: DcMotor>(
    drivetrain: &mut Drivetrain<M>,
    snapshot: &EncoderSnapshot,
    ceiling: f32,
) {
    let powers = drivetrain.last_command().powers;
    for wheel in Wheel::ALL {
        let i = wheel as usize;
        if snapshot.ticks[i].unsigned_abs() as f32 > ceiling && powers[i] != 0.0 {
            tracing::debug!(?wheel, ticks = snapshot.ticks[i], ceiling, "wheel past ceiling");
            drivetrain.set_wheel_power(wheel, 0.0);
        }
    }
}

fn report<H: OpModeHost>(
    host: &mut H,
    active: &ActiveMotion,
    snapshot: &EncoderSnapshot,
    travelled: f32,
) {
    host.add_data("Ceiling", &active.ceiling);
    host.add_data("FL", &snapshot.ticks[0]);
    host.add_data("FR", &snapshot.ticks[1]);
    host.add_data("BL", &snapshot.ticks[2]);
    host.add_data("BR", &snapshot.ticks[3]);
    host.add_data("Distance", &travelled);
    host.update();
}

/// Open-loop straight drive for a fixed time.
pub fn drive_for_time<M, H>(
    drivetrain: &mut Drivetrain<M>,
    host: &mut H,
    speed: f32,
    duration: Duration,
) where
    M: DcMotor,
    H: OpModeHost,
{
    drivetrain.set_powers(speed);
    host.delay_ms(duration_ms(duration));
    drivetrain.stop_moving();
}

/// Open-loop in-place turn for a fixed time.
pub fn turn_for_time<M, H>(
    drivetrain: &mut Drivetrain<M>,
    host: &mut H,
    direction: Direction,
    speed: f32,
    duration: Duration,
) where
    M: DcMotor,
    H: OpModeHost,
{
    match direction {
        Direction::Left => drivetrain.tank(-speed, speed),
        Direction::Right => drivetrain.tank(speed, -speed),
    }
    host.delay_ms(duration_ms(duration));
    drivetrain.stop_moving();
}

pub(crate) fn duration_ms(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
