//! Robot profiles.
//!
//! A profile carries every tuned constant of one robot configuration: drivetrain
//! geometry, motion timing, tape seeking, mechanism set points and teleop
//! scaling. Two named profiles ship with the crate; others load from JSON.

use core::fmt;

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::utils::math::encoders::WheelGeometry;

/// Longest settle, timeout or back-off a profile may ask for: one hour.
pub const MAX_DURATION_MS: u64 = 3_600_000;

/// Errors that can occur when loading or validating a profile.
#[derive(Debug)]
pub enum ProfileError {
    Parse(serde_json::Error),
    InvalidPulsesPerRevolution(f32),
    InvalidWheelCircumference(f32),
    InvalidDegreesToTicks(f32),
    PowerOutOfRange {
        field: &'static str,
        value: f32,
    },
    DurationTooLong {
        field: &'static str,
        ms: u64,
    },
}

impl fmt::Display for ProfileError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ProfileError::Parse(e) => write!(f, "profile is not valid JSON: {}", e),
            ProfileError::InvalidPulsesPerRevolution(v) => {
                write!(f, "pulses_per_revolution must be positive, got {}", v)
            }
            ProfileError::InvalidWheelCircumference(v) => {
                write!(f, "wheel_circumference must be positive, got {}", v)
            }
            ProfileError::InvalidDegreesToTicks(v) => {
                write!(f, "degrees_to_ticks must be positive, got {}", v)
            }
            ProfileError::PowerOutOfRange { field, value } => {
                write!(f, "{} must lie in [-1, 1], got {}", field, value)
            }
            ProfileError::DurationTooLong { field, ms } => {
                write!(
                    f,
                    "{} must not exceed {} ms, got {}",
                    field, MAX_DURATION_MS, ms
                )
            }
        }
    }
}

impl core::error::Error for ProfileError {}

impl From<serde_json::Error> for ProfileError {
    fn from(e: serde_json::Error) -> Self {
        ProfileError::Parse(e)
    }
}

/// Shipped robot configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileName {
    /// Tow hook and block grabber, backs off after finding the tape.
    TowBot,
    /// Adds the intake motor and parks directly on the tape.
    IntakeBot,
}

impl ProfileName {
    pub fn profile(self) -> RobotProfile {
        match self {
            ProfileName::TowBot => RobotProfile::tow_bot(),
            ProfileName::IntakeBot => RobotProfile::intake_bot(),
        }
    }
}

/// Timing of the closed-loop primitives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Pause after the wheels stop, before the primitive returns.
    pub settle_ms: u64,
    /// Give up on a primitive that has not reached its target after this long.
    pub timeout_ms: Option<u64>,
}

impl MotionConfig {
    pub fn settle(&self) -> Duration {
        bounded(self.settle_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(bounded)
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            settle_ms: 10_000,
            timeout_ms: Some(30_000),
        }
    }
}

/// Reverse-and-settle performed after the tape is found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Backoff {
    pub power: f32,
    pub ms: u64,
}

impl Backoff {
    pub fn duration(&self) -> Duration {
        bounded(self.ms)
    }
}

/// Unvalidated profiles still never overflow the clock.
fn bounded(ms: u64) -> Duration {
    Duration::from_millis(ms.min(MAX_DURATION_MS))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapeConfig {
    pub seek_power: f32,
    pub backoff: Option<Backoff>,
}

impl Default for TapeConfig {
    fn default() -> Self {
        Self {
            seek_power: 0.6,
            backoff: Some(Backoff {
                power: 1.0,
                ms: 100,
            }),
        }
    }
}

/// Set points of the auxiliary mechanisms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MechanismConfig {
    pub tow_up: i32,
    pub tow_down: i32,
    pub tow_power: f32,
    pub grabber_open: f32,
    pub grabber_closed: f32,
    pub arm_ticks_per_level: i32,
    /// Arm balancer servo position at arm position zero.
    pub balancer_offset: f32,
    /// Arm balancer servo travel per arm encoder tick.
    pub balancer_gain: f32,
    pub has_intake: bool,
}

impl Default for MechanismConfig {
    fn default() -> Self {
        Self {
            tow_up: 0,
            tow_down: 280,
            tow_power: 0.5,
            grabber_open: 0.0,
            grabber_closed: 0.65,
            arm_ticks_per_level: 120,
            balancer_offset: 0.5,
            balancer_gain: -0.0015,
            has_intake: false,
        }
    }
}

/// Operator loop scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleopConfig {
    pub full_speed: f32,
    pub sniper_speed: f32,
    /// Arm power per unit of gunner right-stick deflection.
    pub arm_manual_scale: f32,
    pub capstone_target: i32,
    pub capstone_power: f32,
    /// Power used to hold the arm when the lock is toggled on.
    pub arm_hold_power: f32,
}

impl Default for TeleopConfig {
    fn default() -> Self {
        Self {
            full_speed: 1.0,
            sniper_speed: 0.5,
            arm_manual_scale: 0.1,
            capstone_target: -23,
            capstone_power: 0.15,
            arm_hold_power: 0.3,
        }
    }
}

/// Every tuned constant of one robot configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotProfile {
    pub geometry: WheelGeometry,
    pub motion: MotionConfig,
    pub tape: TapeConfig,
    pub mechanisms: MechanismConfig,
    pub teleop: TeleopConfig,
}

impl Default for RobotProfile {
    fn default() -> Self {
        Self::tow_bot()
    }
}

impl RobotProfile {
    /// 1120-pulse motors on 4" wheels, tow hook and grabber.
    pub fn tow_bot() -> Self {
        Self {
            geometry: WheelGeometry::new(1120.0, 12.566, 12.4),
            motion: MotionConfig::default(),
            tape: TapeConfig::default(),
            mechanisms: MechanismConfig::default(),
            teleop: TeleopConfig::default(),
        }
    }

    /// 537.6-pulse motors on 100 mm wheels with an intake; parks on the tape
    /// without backing off.
    pub fn intake_bot() -> Self {
        Self {
            geometry: WheelGeometry::new(537.6, 314.16, 6.1),
            motion: MotionConfig {
                settle_ms: 10_000,
                timeout_ms: Some(20_000),
            },
            tape: TapeConfig {
                seek_power: 0.6,
                backoff: None,
            },
            mechanisms: MechanismConfig {
                has_intake: true,
                arm_ticks_per_level: 96,
                ..MechanismConfig::default()
            },
            teleop: TeleopConfig::default(),
        }
    }

    /// Parse a JSON profile. Missing fields fall back to the `tow_bot` values.
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let profile: RobotProfile = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        let g = &self.geometry;
        if !(g.pulses_per_revolution > 0.0) {
            return Err(ProfileError::InvalidPulsesPerRevolution(
                g.pulses_per_revolution,
            ));
        }
        if !(g.wheel_circumference > 0.0) {
            return Err(ProfileError::InvalidWheelCircumference(
                g.wheel_circumference,
            ));
        }
        if !(g.degrees_to_ticks > 0.0) {
            return Err(ProfileError::InvalidDegreesToTicks(g.degrees_to_ticks));
        }

        let mut powers = [
            ("tape.seek_power", self.tape.seek_power),
            ("mechanisms.tow_power", self.mechanisms.tow_power),
            ("teleop.full_speed", self.teleop.full_speed),
            ("teleop.sniper_speed", self.teleop.sniper_speed),
            ("teleop.capstone_power", self.teleop.capstone_power),
            ("teleop.arm_hold_power", self.teleop.arm_hold_power),
            ("tape.backoff.power", 0.0),
        ];
        if let Some(backoff) = self.tape.backoff {
            powers[6].1 = backoff.power;
        }
        for (field, value) in powers {
            if !(-1.0..=1.0).contains(&value) {
                tracing::error!(field, value, "power out of range");
                return Err(ProfileError::PowerOutOfRange { field, value });
            }
        }

        let durations = [
            ("motion.settle_ms", Some(self.motion.settle_ms)),
            ("motion.timeout_ms", self.motion.timeout_ms),
            ("tape.backoff.ms", self.tape.backoff.map(|b| b.ms)),
        ];
        for (field, ms) in durations {
            if let Some(ms) = ms.filter(|&ms| ms > MAX_DURATION_MS) {
                tracing::error!(field, ms, "duration too long");
                return Err(ProfileError::DurationTooLong { field, ms });
            }
        }
        Ok(())
    }
}
