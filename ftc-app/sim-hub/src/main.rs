mod sim;

use std::{error::Error, fs, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use ftc_core::utils::{
    controllers::TeleopLoop,
    hardware::OpModeHost,
    input::Gamepads,
    routine::{Routine, RoutineError, RoutineRunner},
    ProfileName, RobotProfile,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::sim::SimHost;

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// Shipped robot profile
    #[clap(long, default_value = "tow-bot", value_parser = parse_profile)]
    profile: ProfileName,
    /// JSON profile; overrides --profile
    #[clap(long)]
    profile_file: Option<PathBuf>,
    /// Override the post-motion settle pause
    #[clap(long)]
    settle_ms: Option<u64>,
    /// Place tape this far ahead of the start position
    #[clap(long)]
    tape_after: Option<f32>,
    /// Opmode length in seconds; 0 runs without a deadline
    #[clap(long, default_value_t = 30)]
    match_secs: u64,
    #[clap(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Run an autonomous routine
    Auto {
        #[clap(long)]
        routine: PathBuf,
    },
    /// Replay scripted gamepad frames through the operator loop
    Teleop {
        #[clap(long)]
        frames: PathBuf,
    },
}

/// Gamepad state held for `repeat` ticks.
#[derive(Deserialize)]
struct Frame {
    #[serde(default = "one")]
    repeat: u32,
    #[serde(flatten)]
    pads: Gamepads,
}

fn one() -> u32 {
    1
}

fn parse_profile(s: &str) -> Result<ProfileName, String> {
    serde_json::from_value(serde_json::Value::String(s.to_owned())).map_err(|e| e.to_string())
}

fn load_profile(opts: &Opts) -> Result<RobotProfile, Box<dyn Error>> {
    let mut profile = match &opts.profile_file {
        Some(path) => RobotProfile::from_json(&fs::read_to_string(path)?)?,
        None => opts.profile.profile(),
    };
    if let Some(ms) = opts.settle_ms {
        profile.motion.settle_ms = ms;
    }
    profile.validate()?;
    Ok(profile)
}

fn run(opts: Opts) -> Result<(), Box<dyn Error>> {
    let profile = load_profile(&opts)?;
    let (mut robot, motors) = sim::build(profile, opts.tape_after);
    let deadline = (opts.match_secs > 0).then(|| opts.match_secs * 1000);
    let mut host = SimHost::new(motors, deadline);

    match &opts.mode {
        Mode::Auto { routine } => {
            let routine = Routine::from_json(&fs::read_to_string(routine)?)?;
            let mut runner = RoutineRunner::new(&profile);
            match runner.run(&routine, &mut robot, &mut host) {
                Ok(steps) => info!(steps, "routine finished"),
                // The match clock running out is the normal end of a long routine.
                Err(RoutineError::Canceled { step }) => {
                    warn!(step, total = routine.len(), "opmode ended before the routine did")
                }
                Err(e) => return Err(e.into()),
            }
        }
        Mode::Teleop { frames } => {
            let frames: Vec<Frame> = serde_json::from_str(&fs::read_to_string(frames)?)?;
            let mut teleop = TeleopLoop::new(profile.teleop);
            let mut ticks = 0u64;
            'frames: for frame in &frames {
                for _ in 0..frame.repeat {
                    if !host.is_active() {
                        break 'frames;
                    }
                    teleop.tick(&mut robot, &mut host, &frame.pads);
                    host.idle();
                    ticks += 1;
                }
            }
            info!(ticks, horns = host.horns(), speed = teleop.speed(), "teleop finished");
        }
    }

    let travelled = robot.odometer.cumulative(&robot.drivetrain);
    info!(elapsed_ms = host.elapsed_ms(), ?travelled, "opmode stopped");
    for (caption, value) in host.frame() {
        info!("{caption}: {value}");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let opts = Opts::parse();
    match run(opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
