//! Four-wheel drivetrain.
//!
//! Tank, strafe and straight-line primitives over four independently powered
//! wheel motors. The only state kept is the last commanded [`DriveCommand`].

use serde::{Deserialize, Serialize};

use crate::utils::hardware::{DcMotor, RunMode, ZeroPowerBehavior};

/// Wheel index into the motor array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wheel {
    FrontLeft = 0,
    FrontRight = 1,
    BackLeft = 2,
    BackRight = 3,
}

impl Wheel {
    pub const ALL: [Wheel; 4] = [
        Wheel::FrontLeft,
        Wheel::FrontRight,
        Wheel::BackLeft,
        Wheel::BackRight,
    ];
}

/// Lateral direction for strafing and timed turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
}

/// Per-wheel powers, front-left, front-right, back-left, back-right.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveCommand {
    pub powers: [f32; 4],
}

impl DriveCommand {
    pub const STOP: DriveCommand = DriveCommand { powers: [0.0; 4] };

    pub fn tank(
        left: f32,
        right: f32,
    ) -> Self {
        let (l, r) = (clamp_power(left), clamp_power(right));
        Self {
            powers: [l, r, l, r],
        }
    }

    pub fn uniform(power: f32) -> Self {
        let p = clamp_power(power);
        Self { powers: [p; 4] }
    }

    /// Diagonal mecanum pattern: the front-left/back-right pair opposes the
    /// front-right/back-left pair.
    pub fn strafe(
        direction: Direction,
        power: f32,
    ) -> Self {
        let p = clamp_power(power);
        match direction {
            Direction::Left => Self {
                powers: [-p, p, p, -p],
            },
            Direction::Right => Self {
                powers: [p, -p, -p, p],
            },
        }
    }
}

pub(crate) fn clamp_power(power: f32) -> f32 {
    if power.is_nan() {
        0.0
    } else {
        power.clamp(-1.0, 1.0)
    }
}

/// Four wheel motors plus the last command sent to them.
pub struct Drivetrain<M> {
    motors: [M; 4],
    last: DriveCommand,
}

impl<M: DcMotor> Drivetrain<M> {
    pub fn new(
        front_left: M,
        front_right: M,
        back_left: M,
        back_right: M,
    ) -> Self {
        Drivetrain {
            motors: [front_left, front_right, back_left, back_right],
            last: DriveCommand::STOP,
        }
    }

    /// Send a full command to the wheels.
    pub fn apply(
        &mut self,
        command: DriveCommand,
    ) {
        for (motor, &power) in self.motors.iter_mut().zip(command.powers.iter()) {
            motor.set_power(power);
        }
        self.last = command;
    }

    /// Left wheels at `left`, right wheels at `right`.
    pub fn tank(
        &mut self,
        left: f32,
        right: f32,
    ) {
        self.apply(DriveCommand::tank(left, right));
    }

    pub fn strafe(
        &mut self,
        direction: Direction,
        power: f32,
    ) {
        self.apply(DriveCommand::strafe(direction, power));
    }

    /// All wheels at the same signed power.
    pub fn set_powers(
        &mut self,
        power: f32,
    ) {
        self.apply(DriveCommand::uniform(power));
    }

    /// Straight reverse at `power`, whatever its sign.
    pub fn backward(
        &mut self,
        power: f32,
    ) {
        self.set_powers(-libm::fabsf(power));
    }

    pub fn stop_moving(&mut self) {
        self.apply(DriveCommand::STOP);
    }

    /// Override a single wheel, leaving the others as they are.
    pub fn set_wheel_power(
        &mut self,
        wheel: Wheel,
        power: f32,
    ) {
        let p = clamp_power(power);
        self.motors[wheel as usize].set_power(p);
        self.last.powers[wheel as usize] = p;
    }

    pub fn set_mode(
        &mut self,
        mode: RunMode,
    ) {
        for motor in self.motors.iter_mut() {
            motor.set_mode(mode);
        }
    }

    pub fn set_zero_power_behavior(
        &mut self,
        behavior: ZeroPowerBehavior,
    ) {
        for motor in self.motors.iter_mut() {
            motor.set_zero_power_behavior(behavior);
        }
    }

    /// Behavior of the front-left wheel; all four are always set together.
    pub fn zero_power_behavior(&self) -> ZeroPowerBehavior {
        self.motors[Wheel::FrontLeft as usize].zero_power_behavior()
    }

    pub fn positions(&self) -> [i32; 4] {
        [
            self.motors[0].current_position(),
            self.motors[1].current_position(),
            self.motors[2].current_position(),
            self.motors[3].current_position(),
        ]
    }

    pub fn last_command(&self) -> DriveCommand {
        self.last
    }
}
