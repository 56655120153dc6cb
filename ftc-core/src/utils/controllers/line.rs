//! Tape detection with the line sensor.
//!
//! A [`ColorBand`] decides whether a live sample is "on tape": the band is built
//! around the live reading and every channel of the fixed target color must lie
//! strictly inside it. [`TapeSeeker`] drives forward until that happens, then
//! stops, switches the sensor LED off and optionally backs off for a moment.

use embassy_time::Instant;

use crate::utils::{
    config::{RobotProfile, TapeConfig},
    controllers::{motion::MotionOutcome, Robot},
    hardware::{ColorSample, ColorSensor, DcMotor, OpModeHost, Servo},
};

/// Target color with a per-channel tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorBand {
    pub target: ColorSample,
    pub tolerance: i32,
}

impl ColorBand {
    pub const fn new(
        target: ColorSample,
        tolerance: i32,
    ) -> Self {
        Self { target, tolerance }
    }

    /// `true` iff each target channel lies strictly inside
    /// `(sample - tolerance, sample + tolerance)` for the same channel.
    pub fn accepts(
        &self,
        sample: ColorSample,
    ) -> bool {
        within(self.target.r, plus_or_minus(sample.r, self.tolerance))
            && within(self.target.g, plus_or_minus(sample.g, self.tolerance))
            && within(self.target.b, plus_or_minus(sample.b, self.tolerance))
    }
}

fn plus_or_minus(
    value: i32,
    change: i32,
) -> (i32, i32) {
    (value.saturating_sub(change), value.saturating_add(change))
}

fn within(
    value: i32,
    (low, high): (i32, i32),
) -> bool {
    low < value && value < high
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekPhase {
    Idle,
    Seeking,
    BackingOff,
    Done(MotionOutcome),
}

pub struct TapeSeeker {
    config: TapeConfig,
    phase: SeekPhase,
    band: Option<ColorBand>,
    backoff_until: Instant,
}

impl TapeSeeker {
    pub fn new(config: TapeConfig) -> Self {
        TapeSeeker {
            config,
            phase: SeekPhase::Idle,
            band: None,
            backoff_until: Instant::from_ticks(0),
        }
    }

    pub fn from_profile(profile: &RobotProfile) -> Self {
        Self::new(profile.tape)
    }

    pub fn phase(&self) -> SeekPhase {
        self.phase
    }

    /// Light the sensor and start creeping forward at the seek power.
    pub fn begin<M, S, C>(
        &mut self,
        robot: &mut Robot<M, S, C>,
        band: ColorBand,
    ) where
        M: DcMotor,
        S: Servo,
        C: ColorSensor,
    {
        tracing::info!(?band, power = self.config.seek_power, "seeking tape");
        robot.line_sensor.enable_led(true);
        robot.drivetrain.set_powers(self.config.seek_power);
        self.band = Some(band);
        self.phase = SeekPhase::Seeking;
    }

    pub fn tick<M, S, C, H>(
        &mut self,
        robot: &mut Robot<M, S, C>,
        host: &mut H,
    ) -> SeekPhase
    where
        M: DcMotor,
        S: Servo,
        C: ColorSensor,
        H: OpModeHost,
    {
        match self.phase {
            SeekPhase::Seeking => {
                if !host.is_active() {
                    robot.line_sensor.enable_led(false);
                    return self.done(robot, MotionOutcome::Canceled);
                }
                let Some(band) = self.band else {
                    return self.done(robot, MotionOutcome::Canceled);
                };

                let sample = robot.line_sensor.sample();
                host.add_data("Red", &sample.r);
                host.add_data("Green", &sample.g);
                host.add_data("Blue", &sample.b);
                host.update();

                if !band.accepts(sample) {
                    return self.phase;
                }

                tracing::info!(?sample, "tape found");
                robot.line_sensor.enable_led(false);
                match self.config.backoff {
                    Some(backoff) => {
                        robot.drivetrain.stop_moving();
                        robot.drivetrain.backward(backoff.power);
                        self.backoff_until = host.now() + backoff.duration();
                        self.phase = SeekPhase::BackingOff;
                        self.phase
                    }
                    None => self.done(robot, MotionOutcome::Reached),
                }
            }
            SeekPhase::BackingOff => {
                if !host.is_active() {
                    return self.done(robot, MotionOutcome::Canceled);
                }
                if host.now() >= self.backoff_until {
                    return self.done(robot, MotionOutcome::Reached);
                }
                self.phase
            }
            phase => phase,
        }
    }

    /// Drive until the tape is under the sensor.
    #[tracing::instrument(level = "debug", skip(self, robot, host))]
    pub fn stop_at_tape<M, S, C, H>(
        &mut self,
        robot: &mut Robot<M, S, C>,
        host: &mut H,
        target: ColorSample,
        tolerance: i32,
    ) -> MotionOutcome
    where
        M: DcMotor,
        S: Servo,
        C: ColorSensor,
        H: OpModeHost,
    {
        self.begin(robot, ColorBand::new(target, tolerance));
        loop {
            if let SeekPhase::Done(outcome) = self.tick(robot, host) {
                return outcome;
            }
            host.idle();
        }
    }

    fn done<M, S, C>(
        &mut self,
        robot: &mut Robot<M, S, C>,
        outcome: MotionOutcome,
    ) -> SeekPhase
    where
        M: DcMotor,
        S: Servo,
        C: ColorSensor,
    {
        robot.drivetrain.stop_moving();
        self.band = None;
        self.phase = SeekPhase::Done(outcome);
        tracing::debug!(?outcome, "tape seek finished");
        self.phase
    }
}
