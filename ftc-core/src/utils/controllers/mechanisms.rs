//! Auxiliary mechanisms: tow hook, block grabber, arm with balancer servo and
//! an optional intake.

use crate::utils::{
    config::MechanismConfig,
    controllers::drivetrain::clamp_power,
    hardware::{DcMotor, RunMode, Servo},
};

pub struct Mechanisms<M, S> {
    pub tow: M,
    pub arm: M,
    pub intake: Option<M>,
    pub grabber: S,
    pub arm_balancer: S,
    config: MechanismConfig,
}

impl<M: DcMotor, S: Servo> Mechanisms<M, S> {
    pub fn new(
        tow: M,
        arm: M,
        intake: Option<M>,
        grabber: S,
        arm_balancer: S,
        config: MechanismConfig,
    ) -> Self {
        if config.has_intake != intake.is_some() {
            tracing::warn!(
                expected = config.has_intake,
                "intake motor presence does not match the profile"
            );
        }
        Mechanisms {
            tow,
            arm,
            intake,
            grabber,
            arm_balancer,
            config,
        }
    }

    pub fn drop_tow(&mut self) {
        run_to_position(&mut self.tow, self.config.tow_down, self.config.tow_power);
    }

    pub fn raise_tow(&mut self) {
        run_to_position(&mut self.tow, self.config.tow_up, self.config.tow_power);
    }

    pub fn grab_block(&mut self) {
        self.grabber.set_position(self.config.grabber_closed);
    }

    pub fn release_block(&mut self) {
        self.grabber.set_position(self.config.grabber_open);
    }

    /// Send the arm to a numbered level.
    pub fn move_arm(
        &mut self,
        level: i32,
        speed: f32,
    ) {
        let target = level.saturating_mul(self.config.arm_ticks_per_level);
        tracing::info!(level, target, "arm to level");
        run_to_position(&mut self.arm, target, speed);
    }

    /// Closed-loop hold at `target`.
    pub fn hold_arm(
        &mut self,
        target: i32,
        power: f32,
    ) {
        if self.arm.mode() != RunMode::RunToPosition || self.arm.target_position() != target {
            run_to_position(&mut self.arm, target, power);
        }
    }

    /// Open-loop arm power.
    pub fn drive_arm(
        &mut self,
        power: f32,
    ) {
        if self.arm.mode() != RunMode::RunUsingEncoder {
            self.arm.set_mode(RunMode::RunUsingEncoder);
        }
        self.arm.set_power(clamp_power(power));
    }

    /// Make the arm's current position the new zero.
    pub fn reset_arm_encoder(&mut self) {
        self.arm.set_mode(RunMode::StopAndResetEncoder);
        self.arm.set_mode(RunMode::RunUsingEncoder);
    }

    /// No-op on robots without an intake.
    pub fn set_intake_power(
        &mut self,
        power: f32,
    ) {
        if let Some(intake) = self.intake.as_mut() {
            intake.set_power(clamp_power(power));
        }
    }

    /// Balancer servo position that keeps the grabber level at `arm_ticks`.
    pub fn arm_balancer_position(
        &self,
        arm_ticks: i32,
    ) -> f32 {
        let p = self.config.balancer_offset + self.config.balancer_gain * arm_ticks as f32;
        p.clamp(0.0, 1.0)
    }

    pub fn update_arm_balancer(&mut self) {
        let position = self.arm_balancer_position(self.arm.current_position());
        self.arm_balancer.set_position(position);
    }
}

fn run_to_position<M: DcMotor>(
    motor: &mut M,
    target: i32,
    power: f32,
) {
    motor.set_target_position(target);
    motor.set_mode(RunMode::RunToPosition);
    motor.set_power(clamp_power(power));
}
