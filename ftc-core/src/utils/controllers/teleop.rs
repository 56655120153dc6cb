//! The operator loop.
//!
//! `TeleopLoop::tick` is called once per host tick and never blocks. It maps
//! the two gamepads onto the drivetrain and mechanisms:
//!
//! Driver:
//!  - Left/right bumper: strafe; both at once cancels the drive command.
//!  - Left/right stick Y: tank drive, scaled by the speed multiplier.
//!  - `a`: reverse direction. `b`: toggle sniper mode. `x`: horn.
//!  - Dpad down/up: drop/raise the tow.
//!
//! Gunner:
//!  - `a`/`b`: grab/release block.
//!  - `x`: capstone preset (locks the arm).
//!  - `y`: toggle the arm lock at the current position.
//!  - Both bumpers with the arm idle: re-zero the arm encoder.
//!  - Right stick Y: arm power while unlocked.
//!  - Triggers: intake in/out.

use crate::utils::{
    config::TeleopConfig,
    controllers::{drivetrain::Direction, Robot},
    hardware::{ColorSensor, DcMotor, OpModeHost, Servo},
    input::{Button, Debouncer, GamepadId, Gamepads},
};

/// Who owns the arm this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArmMode {
    /// Analog power from the gunner's right stick.
    Manual,
    /// Closed-loop hold at `target`.
    Locked { target: i32, power: f32 },
}

pub struct TeleopLoop {
    config: TeleopConfig,
    debouncer: Debouncer,
    speed: f32,
    arm: ArmMode,
}

impl TeleopLoop {
    pub fn new(config: TeleopConfig) -> Self {
        TeleopLoop {
            config,
            debouncer: Debouncer::new(),
            speed: config.full_speed,
            arm: ArmMode::Manual,
        }
    }

    /// Signed speed multiplier; negative while driving reversed.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn is_sniper(&self) -> bool {
        libm::fabsf(self.speed) < self.config.full_speed
    }

    pub fn arm_mode(&self) -> ArmMode {
        self.arm
    }

    pub fn tick<M, S, C, H>(
        &mut self,
        robot: &mut Robot<M, S, C>,
        host: &mut H,
        pads: &Gamepads,
    ) where
        M: DcMotor,
        S: Servo,
        C: ColorSensor,
        H: OpModeHost,
    {
        self.debouncer.sample(pads);
        for control in self.debouncer.events() {
            tracing::trace!(?control, "pressed");
        }
        let driver = &pads.driver;
        let gunner = &pads.gunner;

        match (driver.left_bumper, driver.right_bumper) {
            (true, true) => robot.drivetrain.stop_moving(),
            (true, false) => robot.drivetrain.strafe(Direction::Left, self.speed),
            (false, true) => robot.drivetrain.strafe(Direction::Right, self.speed),
            (false, false) => {
                let (left, right) = tank_powers(driver.left_stick.y, driver.right_stick.y, self.speed);
                robot.drivetrain.tank(left, right);
            }
        }

        if self.debouncer.pressed(GamepadId::Driver, Button::A) {
            self.speed = -self.speed;
            tracing::info!(speed = self.speed, "direction reversed");
        }
        if self.debouncer.pressed(GamepadId::Driver, Button::B) {
            self.speed = toggle_sniper(self.speed, self.config.full_speed, self.config.sniper_speed);
            tracing::info!(speed = self.speed, "sniper toggled");
        }
        if self.debouncer.pressed(GamepadId::Driver, Button::X) {
            host.play_sound();
        }

        let mechanisms = &mut robot.mechanisms;
        if driver.dpad_down {
            mechanisms.drop_tow();
        }
        if driver.dpad_up {
            mechanisms.raise_tow();
        }
        if gunner.a {
            mechanisms.grab_block();
        }
        if gunner.b {
            mechanisms.release_block();
        }
        mechanisms.set_intake_power(gunner.right_trigger - gunner.left_trigger);

        if self.debouncer.pressed(GamepadId::Gunner, Button::Y) {
            self.arm = match self.arm {
                ArmMode::Manual => ArmMode::Locked {
                    target: mechanisms.arm.current_position(),
                    power: self.config.arm_hold_power,
                },
                ArmMode::Locked { .. } => ArmMode::Manual,
            };
            tracing::info!(arm = ?self.arm, "arm lock toggled");
        }
        if gunner.x {
            self.arm = ArmMode::Locked {
                target: self.config.capstone_target,
                power: self.config.capstone_power,
            };
        }
        if gunner.left_bumper && gunner.right_bumper && !mechanisms.arm.is_busy() {
            tracing::info!("arm encoder re-zeroed");
            mechanisms.reset_arm_encoder();
            self.arm = ArmMode::Manual;
        }

        match self.arm {
            ArmMode::Locked { target, power } => mechanisms.hold_arm(target, power),
            ArmMode::Manual => {
                if !mechanisms.arm.is_busy() {
                    mechanisms.drive_arm(gunner.right_stick.y * self.config.arm_manual_scale);
                }
            }
        }
        mechanisms.update_arm_balancer();

        let color = robot.line_sensor.sample();
        host.add_data("Tow", &robot.mechanisms.tow.current_position());
        host.add_data("Arm", &robot.mechanisms.arm.current_position());
        host.add_data("Servo", &robot.mechanisms.arm_balancer.position());
        host.add_data("Red", &color.r);
        host.add_data("Green", &color.g);
        host.add_data("Blue", &color.b);
        host.add_data("Speed", &self.speed);
        host.add_data("Sniper", &self.is_sniper());
        host.add_data("ArmLock", &matches!(self.arm, ArmMode::Locked { .. }));
        host.update();
    }
}

/// Stick Y is negative forward. Reversed driving also swaps the sides so the
/// robot still turns toward the stick that is pushed harder.
fn tank_powers(
    left_stick_y: f32,
    right_stick_y: f32,
    speed: f32,
) -> (f32, f32) {
    let left = -left_stick_y * speed;
    let right = -right_stick_y * speed;
    if speed < 0.0 {
        (right, left)
    } else {
        (left, right)
    }
}

/// Full ↔ sniper, keeping the current direction.
fn toggle_sniper(
    speed: f32,
    full: f32,
    sniper: f32,
) -> f32 {
    if speed > 0.0 {
        if speed > sniper {
            sniper
        } else {
            full
        }
    } else if speed < -sniper {
        -sniper
    } else {
        -full
    }
}
