//! Virtual-time robot model.
//!
//! Motors integrate their commanded power over simulated time; the line sensor
//! reports tape once the drivetrain has covered a configured distance. Nothing
//! here sleeps for real, so a 30 s opmode runs in milliseconds.

use std::{
    cell::{Cell, RefCell},
    fmt::Display,
    rc::Rc,
};

use embassy_time::Instant;
use embedded_hal::delay::DelayNs;
use ftc_core::utils::{
    controllers::{Drivetrain, Robot},
    hardware::{
        ColorSample, ColorSensor, DcMotor, OpModeHost, RunMode, Servo, Telemetry,
        ZeroPowerBehavior,
    },
    RobotProfile,
};

/// Length of one host polling interval.
pub const STEP_MS: u64 = 20;

/// Free-running wheel speed, in revolutions per second at full power.
const FULL_SPEED_RPS: f64 = 2.5;

const FLOOR: ColorSample = ColorSample::new(22, 24, 20);
const TAPE: ColorSample = ColorSample::new(40, 60, 160);

#[derive(Debug)]
pub struct MotorModel {
    power: f32,
    /// Encoder reading since the last reset.
    position: f64,
    /// Signed travel since power-on; survives encoder resets.
    travel: f64,
    mode: RunMode,
    target: i32,
    zero_power: ZeroPowerBehavior,
    ticks_per_second: f64,
}

impl MotorModel {
    fn new(ticks_per_second: f64) -> Self {
        MotorModel {
            power: 0.0,
            position: 0.0,
            travel: 0.0,
            mode: RunMode::RunUsingEncoder,
            target: 0,
            zero_power: ZeroPowerBehavior::Float,
            ticks_per_second,
        }
    }

    fn advance(
        &mut self,
        seconds: f64,
    ) {
        let step = f64::from(self.power) * self.ticks_per_second * seconds;
        let moved = match self.mode {
            RunMode::StopAndResetEncoder => 0.0,
            RunMode::RunToPosition => {
                let remaining = f64::from(self.target) - self.position;
                remaining.signum() * step.abs().min(remaining.abs())
            }
            RunMode::RunUsingEncoder | RunMode::RunWithoutEncoder => step,
        };
        self.position += moved;
        self.travel += moved;
    }
}

pub type SharedMotor = Rc<RefCell<MotorModel>>;

#[derive(Clone)]
pub struct SimMotor {
    model: SharedMotor,
}

impl SimMotor {
    fn new(ticks_per_second: f64) -> (Self, SharedMotor) {
        let model = Rc::new(RefCell::new(MotorModel::new(ticks_per_second)));
        (
            SimMotor {
                model: model.clone(),
            },
            model,
        )
    }
}

impl DcMotor for SimMotor {
    fn set_power(
        &mut self,
        power: f32,
    ) {
        self.model.borrow_mut().power = power.clamp(-1.0, 1.0);
    }
    fn power(&self) -> f32 {
        self.model.borrow().power
    }
    fn current_position(&self) -> i32 {
        self.model.borrow().position.round() as i32
    }
    fn set_mode(
        &mut self,
        mode: RunMode,
    ) {
        let mut m = self.model.borrow_mut();
        if mode == RunMode::StopAndResetEncoder {
            m.position = 0.0;
            m.power = 0.0;
        }
        m.mode = mode;
    }
    fn mode(&self) -> RunMode {
        self.model.borrow().mode
    }
    fn set_target_position(
        &mut self,
        ticks: i32,
    ) {
        self.model.borrow_mut().target = ticks;
    }
    fn target_position(&self) -> i32 {
        self.model.borrow().target
    }
    fn set_zero_power_behavior(
        &mut self,
        behavior: ZeroPowerBehavior,
    ) {
        self.model.borrow_mut().zero_power = behavior;
    }
    fn zero_power_behavior(&self) -> ZeroPowerBehavior {
        self.model.borrow().zero_power
    }
    fn is_busy(&self) -> bool {
        let m = self.model.borrow();
        m.mode == RunMode::RunToPosition
            && m.power != 0.0
            && (m.position - f64::from(m.target)).abs() >= 1.0
    }
}

#[derive(Clone, Default)]
pub struct SimServo {
    position: Rc<Cell<f32>>,
}

impl Servo for SimServo {
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

/// Sees a strip of tape `tape_at` ticks of lifetime travel from the start.
pub struct TapeSensor {
    wheels: [SharedMotor; 4],
    tape_at: Option<f64>,
    width: f64,
    led: bool,
}

impl TapeSensor {
    fn current(&self) -> ColorSample {
        let Some(at) = self.tape_at else {
            return FLOOR;
        };
        let travel =
            self.wheels.iter().map(|w| w.borrow().travel).sum::<f64>() / self.wheels.len() as f64;
        if travel >= at && travel < at + self.width {
            TAPE
        } else {
            FLOOR
        }
    }
}

impl ColorSensor for TapeSensor {
    fn red(&mut self) -> i32 {
        self.current().r
    }
    fn green(&mut self) -> i32 {
        self.current().g
    }
    fn blue(&mut self) -> i32 {
        self.current().b
    }
    fn enable_led(
        &mut self,
        on: bool,
    ) {
        if on != self.led {
            tracing::debug!(on, "line sensor LED");
        }
        self.led = on;
    }
}

pub type SimRobot = Robot<SimMotor, SimServo, TapeSensor>;

/// Build a simulated robot for `profile`. Returns the robot plus every motor
/// model so the host can advance them.
pub fn build(
    profile: RobotProfile,
    tape_after: Option<f32>,
) -> (SimRobot, Vec<SharedMotor>) {
    let tps = f64::from(profile.geometry.pulses_per_revolution) * FULL_SPEED_RPS;
    let (fl, fl_m) = SimMotor::new(tps);
    let (fr, fr_m) = SimMotor::new(tps);
    let (bl, bl_m) = SimMotor::new(tps);
    let (br, br_m) = SimMotor::new(tps);
    let (tow, tow_m) = SimMotor::new(tps);
    let (arm, arm_m) = SimMotor::new(tps);
    let mut models = vec![
        fl_m.clone(),
        fr_m.clone(),
        bl_m.clone(),
        br_m.clone(),
        tow_m,
        arm_m,
    ];
    let intake = profile.mechanisms.has_intake.then(|| {
        let (intake, intake_m) = SimMotor::new(tps);
        models.push(intake_m);
        intake
    });

    let sensor = TapeSensor {
        wheels: [fl_m, fr_m, bl_m, br_m],
        tape_at: tape_after.map(|d| f64::from(profile.geometry.distance_to_ticks(d))),
        width: f64::from(profile.geometry.pulses_per_revolution) / 4.0,
        led: false,
    };

    let robot = Robot::new(
        Drivetrain::new(fl, fr, bl, br),
        tow,
        arm,
        intake,
        SimServo::default(),
        SimServo::default(),
        sensor,
        Some(profile),
    );
    (robot, models)
}

/// Opmode host running on a virtual clock.
pub struct SimHost {
    clock_ms: u64,
    deadline_ms: Option<u64>,
    motors: Vec<SharedMotor>,
    pending: Vec<(String, String)>,
    frame: Vec<(String, String)>,
    horns: usize,
}

impl SimHost {
    pub fn new(
        motors: Vec<SharedMotor>,
        deadline_ms: Option<u64>,
    ) -> Self {
        SimHost {
            clock_ms: 0,
            deadline_ms,
            motors,
            pending: Vec::new(),
            frame: Vec::new(),
            horns: 0,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn horns(&self) -> usize {
        self.horns
    }

    /// Last published telemetry frame.
    pub fn frame(&self) -> &[(String, String)] {
        &self.frame
    }

    fn advance(
        &mut self,
        mut ms: u64,
    ) {
        while ms > 0 {
            let step = ms.min(STEP_MS);
            let seconds = step as f64 / 1000.0;
            for motor in &self.motors {
                motor.borrow_mut().advance(seconds);
            }
            self.clock_ms += step;
            ms -= step;
        }
    }
}

impl Telemetry for SimHost {
    fn add_data(
        &mut self,
        caption: &str,
        value: &dyn Display,
    ) {
        self.pending.push((caption.to_string(), value.to_string()));
    }

    fn update(&mut self) {
        self.frame = std::mem::take(&mut self.pending);
        tracing::trace!(t = self.clock_ms, frame = ?self.frame, "telemetry");
    }
}

impl DelayNs for SimHost {
    fn delay_ns(
        &mut self,
        ns: u32,
    ) {
        self.advance(u64::from(ns).div_ceil(1_000_000));
    }

    fn delay_ms(
        &mut self,
        ms: u32,
    ) {
        self.advance(u64::from(ms));
    }
}

impl OpModeHost for SimHost {
    fn is_active(&self) -> bool {
        self.deadline_ms.is_none_or(|d| self.clock_ms < d)
    }

    fn now(&self) -> Instant {
        Instant::from_millis(self.clock_ms)
    }

    fn idle(&mut self) {
        self.advance(STEP_MS);
    }

    fn play_sound(&mut self) {
        self.horns += 1;
        tracing::info!(t = self.clock_ms, "horn");
    }
}
