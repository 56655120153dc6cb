//! Motion-control core and operator loop for a four-wheel FTC robot on no-std platforms.
//!
//! Hardware, the opmode lifecycle and telemetry are reached through the traits in
//! [`utils::hardware`]; everything else lives here. See `ftc-app/sim-hub` for a
//! runnable host that drives the core against a simulated robot.
#![no_std]

extern crate alloc;

pub mod utils;
