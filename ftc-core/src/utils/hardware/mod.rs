//! Hardware and host collaborator traits.
//!
//! The robot core never talks to device drivers directly. Motors, servos and the
//! line sensor are reached through the traits below, and the opmode host supplies
//! the active flag, the clock, the polling cadence, blocking sleep and telemetry.

use core::fmt::Display;

use embassy_time::Instant;
use embedded_hal::delay::DelayNs;
use serde::{Deserialize, Serialize};

/// Motor run modes understood by the motor controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Zero the encoder and hold the motor stopped.
    StopAndResetEncoder,
    /// Open-loop power with the encoder counting.
    RunUsingEncoder,
    /// Open-loop power, encoder ignored.
    RunWithoutEncoder,
    /// Closed-loop travel to the target position at the commanded power.
    RunToPosition,
}

/// What a motor does when commanded to zero power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroPowerBehavior {
    Brake,
    Float,
}

/// A DC motor with an integrated encoder.
///
/// Power is expected in `[-1.0, 1.0]`; implementations clamp.
pub trait DcMotor {
    fn set_power(
        &mut self,
        power: f32,
    );
    fn power(&self) -> f32;
    fn current_position(&self) -> i32;
    fn set_mode(
        &mut self,
        mode: RunMode,
    );
    fn mode(&self) -> RunMode;
    fn set_target_position(
        &mut self,
        ticks: i32,
    );
    fn target_position(&self) -> i32;
    fn set_zero_power_behavior(
        &mut self,
        behavior: ZeroPowerBehavior,
    );
    fn zero_power_behavior(&self) -> ZeroPowerBehavior;
    /// `true` while a `RunToPosition` move is still travelling.
    fn is_busy(&self) -> bool;
}

/// A positional servo, position in `[0.0, 1.0]`.
pub trait Servo {
    fn set_position(
        &mut self,
        position: f32,
    );
    fn position(&self) -> f32;
}

/// One reading of the color sensor channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColorSample {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

impl ColorSample {
    pub const fn new(
        r: i32,
        g: i32,
        b: i32,
    ) -> Self {
        Self { r, g, b }
    }
}

/// Color sensor with an illumination LED.
pub trait ColorSensor {
    fn red(&mut self) -> i32;
    fn green(&mut self) -> i32;
    fn blue(&mut self) -> i32;
    fn enable_led(
        &mut self,
        on: bool,
    );

    /// Read all three channels.
    fn sample(&mut self) -> ColorSample {
        ColorSample {
            r: self.red(),
            g: self.green(),
            b: self.blue(),
        }
    }
}

/// Key-value display sink on the driver station.
pub trait Telemetry {
    fn add_data(
        &mut self,
        caption: &str,
        value: &dyn Display,
    );
    /// Push the pending items to the display.
    fn update(&mut self);
}

/// The opmode host: lifecycle flag, clock, polling cadence and telemetry.
///
/// Blocking sleep comes from [`DelayNs`]; `idle` is the single polling step the
/// blocking primitives take between iterations.
pub trait OpModeHost: DelayNs + Telemetry {
    /// `false` once stop is requested or the opmode is no longer running.
    fn is_active(&self) -> bool;
    fn now(&self) -> Instant;
    /// Yield for one polling interval.
    fn idle(&mut self);
    /// Horn requested by the driver. Hosts without sound ignore it.
    fn play_sound(&mut self) {}
}
