//! Fake hardware and host shared by the integration tests.
#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt::Display,
    rc::Rc,
};

use embassy_time::Instant;
use embedded_hal::delay::DelayNs;
use embedded_hal_mock::eh1::delay::NoopDelay;
use ftc_core::utils::{
    controllers::{Drivetrain, Robot},
    hardware::{
        ColorSample, ColorSensor, DcMotor, OpModeHost, RunMode, Servo, Telemetry,
        ZeroPowerBehavior,
    },
    RobotProfile,
};

/// Polling interval of the fake host.
pub const STEP_MS: u64 = 10;
/// Encoder ticks a wheel covers per polling interval at full power.
pub const TICKS_PER_STEP: f32 = 10.0;

#[derive(Debug)]
pub struct MotorState {
    pub power: f32,
    pub position: f32,
    pub mode: RunMode,
    pub target: i32,
    pub zero_power: ZeroPowerBehavior,
    /// Multiplier on simulated travel, to make one wheel run fast.
    pub gain: f32,
    pub powers: Vec<f32>,
    pub modes: Vec<RunMode>,
}

impl Default for MotorState {
    fn default() -> Self {
        MotorState {
            power: 0.0,
            position: 0.0,
            mode: RunMode::RunUsingEncoder,
            target: 0,
            zero_power: ZeroPowerBehavior::Float,
            gain: 1.0,
            powers: Vec::new(),
            modes: Vec::new(),
        }
    }
}

impl MotorState {
    fn step(
        &mut self,
        steps: f32,
    ) {
        let travel = self.power * TICKS_PER_STEP * self.gain * steps;
        match self.mode {
            RunMode::RunUsingEncoder | RunMode::RunWithoutEncoder => self.position += travel,
            RunMode::RunToPosition => {
                let target = self.target as f32;
                let remaining = target - self.position;
                let reach = travel.abs();
                if remaining.abs() <= reach {
                    self.position = target;
                } else {
                    self.position += reach * remaining.signum();
                }
            }
            RunMode::StopAndResetEncoder => {}
        }
    }
}

pub type MotorHandle = Rc<RefCell<MotorState>>;

#[derive(Clone, Default)]
pub struct FakeMotor {
    pub state: MotorHandle,
}

impl FakeMotor {
    pub fn new() -> (Self, MotorHandle) {
        let motor = FakeMotor::default();
        let handle = motor.state.clone();
        (motor, handle)
    }
}

impl DcMotor for FakeMotor {
    fn set_power(
        &mut self,
        power: f32,
    ) {
        let mut s = self.state.borrow_mut();
        let power = power.clamp(-1.0, 1.0);
        s.power = power;
        s.powers.push(power);
    }
    fn power(&self) -> f32 {
        self.state.borrow().power
    }
    fn current_position(&self) -> i32 {
        self.state.borrow().position.round() as i32
    }
    fn set_mode(
        &mut self,
        mode: RunMode,
    ) {
        let mut s = self.state.borrow_mut();
        if mode == RunMode::StopAndResetEncoder {
            s.position = 0.0;
            s.power = 0.0;
        }
        s.mode = mode;
        s.modes.push(mode);
    }
    fn mode(&self) -> RunMode {
        self.state.borrow().mode
    }
    fn set_target_position(
        &mut self,
        ticks: i32,
    ) {
        self.state.borrow_mut().target = ticks;
    }
    fn target_position(&self) -> i32 {
        self.state.borrow().target
    }
    fn set_zero_power_behavior(
        &mut self,
        behavior: ZeroPowerBehavior,
    ) {
        self.state.borrow_mut().zero_power = behavior;
    }
    fn zero_power_behavior(&self) -> ZeroPowerBehavior {
        self.state.borrow().zero_power
    }
    fn is_busy(&self) -> bool {
        let s = self.state.borrow();
        s.mode == RunMode::RunToPosition
            && s.power != 0.0
            && (s.position - s.target as f32).abs() >= 0.5
    }
}

#[derive(Clone, Default)]
pub struct FakeServo {
    pub position: Rc<Cell<f32>>,
}

impl Servo for FakeServo {
    fn set_position(
        &mut self,
        position: f32,
    ) {
        self.position.set(position.clamp(0.0, 1.0));
    }
    fn position(&self) -> f32 {
        self.position.get()
    }
}

/// Replays queued samples, then repeats `floor` forever.
#[derive(Clone)]
pub struct FakeColorSensor {
    pub queue: Rc<RefCell<VecDeque<ColorSample>>>,
    pub floor: ColorSample,
    pub current: Rc<Cell<ColorSample>>,
    pub led: Rc<Cell<bool>>,
    pub reads: Rc<Cell<usize>>,
}

impl Default for FakeColorSensor {
    fn default() -> Self {
        FakeColorSensor {
            queue: Rc::default(),
            floor: ColorSample::new(20, 20, 20),
            current: Rc::new(Cell::new(ColorSample::new(20, 20, 20))),
            led: Rc::default(),
            reads: Rc::default(),
        }
    }
}

impl ColorSensor for FakeColorSensor {
    fn red(&mut self) -> i32 {
        self.current.get().r
    }
    fn green(&mut self) -> i32 {
        self.current.get().g
    }
    fn blue(&mut self) -> i32 {
        self.current.get().b
    }
    fn enable_led(
        &mut self,
        on: bool,
    ) {
        self.led.set(on);
    }
    fn sample(&mut self) -> ColorSample {
        let next = self.queue.borrow_mut().pop_front().unwrap_or(self.floor);
        self.current.set(next);
        self.reads.set(self.reads.get() + 1);
        next
    }
}

/// Virtual-time host. Each `idle` advances the clock by `STEP_MS` and moves
/// every registered motor.
pub struct FakeHost<D = NoopDelay> {
    pub now_ms: u64,
    pub idles: usize,
    /// Goes inactive once this many idles have elapsed.
    pub active_for: Option<usize>,
    pub motors: Vec<MotorHandle>,
    pub telemetry: Vec<(String, String)>,
    pub updates: usize,
    pub sounds: usize,
    pub slept_ms: u64,
    pub delay: D,
}

impl FakeHost<NoopDelay> {
    pub fn new(motors: Vec<MotorHandle>) -> Self {
        FakeHost::with_delay(motors, NoopDelay::new())
    }
}

impl<D: DelayNs> FakeHost<D> {
    pub fn with_delay(
        motors: Vec<MotorHandle>,
        delay: D,
    ) -> Self {
        FakeHost {
            now_ms: 0,
            idles: 0,
            active_for: None,
            motors,
            telemetry: Vec::new(),
            updates: 0,
            sounds: 0,
            slept_ms: 0,
            delay,
        }
    }

    pub fn value(
        &self,
        caption: &str,
    ) -> Option<&str> {
        self.telemetry
            .iter()
            .rev()
            .find(|(k, _)| k == caption)
            .map(|(_, v)| v.as_str())
    }

    fn advance(
        &mut self,
        ms: u64,
    ) {
        self.now_ms += ms;
        let steps = ms as f32 / STEP_MS as f32;
        for motor in &self.motors {
            motor.borrow_mut().step(steps);
        }
    }
}

impl<D: DelayNs> Telemetry for FakeHost<D> {
    fn add_data(
        &mut self,
        caption: &str,
        value: &dyn Display,
    ) {
        self.telemetry.push((caption.to_string(), value.to_string()));
    }
    fn update(&mut self) {
        self.updates += 1;
    }
}

impl<D: DelayNs> DelayNs for FakeHost<D> {
    fn delay_ns(
        &mut self,
        ns: u32,
    ) {
        self.advance(u64::from(ns) / 1_000_000);
        self.delay.delay_ns(ns);
    }

    fn delay_ms(
        &mut self,
        ms: u32,
    ) {
        self.slept_ms += u64::from(ms);
        self.advance(u64::from(ms));
        self.delay.delay_ms(ms);
    }
}

impl<D: DelayNs> OpModeHost for FakeHost<D> {
    fn is_active(&self) -> bool {
        self.active_for.map_or(true, |n| self.idles < n)
    }
    fn now(&self) -> Instant {
        Instant::from_millis(self.now_ms)
    }
    fn idle(&mut self) {
        self.idles += 1;
        self.advance(STEP_MS);
    }
    fn play_sound(&mut self) {
        self.sounds += 1;
    }
}

pub type TestRobot = Robot<FakeMotor, FakeServo, FakeColorSensor>;

/// A robot on fake hardware plus handles to every device.
pub struct Rig {
    pub robot: TestRobot,
    pub wheels: [MotorHandle; 4],
    pub tow: MotorHandle,
    pub arm: MotorHandle,
    pub intake: Option<MotorHandle>,
    pub grabber: FakeServo,
    pub balancer: FakeServo,
    pub sensor: FakeColorSensor,
}

impl Rig {
    pub fn new(profile: RobotProfile) -> Self {
        let (fl, fl_h) = FakeMotor::new();
        let (fr, fr_h) = FakeMotor::new();
        let (bl, bl_h) = FakeMotor::new();
        let (br, br_h) = FakeMotor::new();
        let (tow, tow_h) = FakeMotor::new();
        let (arm, arm_h) = FakeMotor::new();
        let (intake, intake_h) = if profile.mechanisms.has_intake {
            let (m, h) = FakeMotor::new();
            (Some(m), Some(h))
        } else {
            (None, None)
        };
        let grabber = FakeServo::default();
        let balancer = FakeServo::default();
        let sensor = FakeColorSensor::default();

        let robot = Robot::new(
            Drivetrain::new(fl, fr, bl, br),
            tow,
            arm,
            intake,
            grabber.clone(),
            balancer.clone(),
            sensor.clone(),
            Some(profile),
        );

        Rig {
            robot,
            wheels: [fl_h, fr_h, bl_h, br_h],
            tow: tow_h,
            arm: arm_h,
            intake: intake_h,
            grabber,
            balancer,
            sensor,
        }
    }

    /// Host that moves every motor of this rig.
    pub fn host(&self) -> FakeHost {
        FakeHost::new(self.handles())
    }

    pub fn handles(&self) -> Vec<MotorHandle> {
        let mut all: Vec<MotorHandle> = self.wheels.iter().cloned().collect();
        all.push(self.tow.clone());
        all.push(self.arm.clone());
        if let Some(intake) = &self.intake {
            all.push(intake.clone());
        }
        all
    }

    pub fn wheel_powers(&self) -> [f32; 4] {
        [0, 1, 2, 3].map(|i| self.wheels[i].borrow().power)
    }

    pub fn set_wheel_positions(
        &self,
        ticks: [i32; 4],
    ) {
        for (wheel, t) in self.wheels.iter().zip(ticks) {
            wheel.borrow_mut().position = t as f32;
        }
    }
}

/// Tow-bot profile with round geometry: 100 ticks per revolution, 10 units of
/// travel per revolution, 2 ticks per degree. No settling pause.
pub fn test_profile() -> RobotProfile {
    let mut profile = RobotProfile::tow_bot();
    profile.geometry.pulses_per_revolution = 100.0;
    profile.geometry.wheel_circumference = 10.0;
    profile.geometry.degrees_to_ticks = 2.0;
    profile.motion.settle_ms = 0;
    profile.motion.timeout_ms = Some(1_000);
    profile
}
