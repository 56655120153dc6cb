//! Operator input.
//!
//! Two gamepads are sampled once per tick: the driver (gamepad 1) and the
//! gunner (gamepad 2). Level state lives in [`GamepadState`]; edges come from
//! the [`debounce::Debouncer`].

pub mod debounce;

use serde::{Deserialize, Serialize};

pub use debounce::{Control, Debouncer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamepadId {
    Driver,
    Gunner,
}

/// Digital controls on a gamepad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    A,
    B,
    X,
    Y,
    LeftBumper,
    RightBumper,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    Back,
    Start,
}

impl Button {
    pub const ALL: [Button; 12] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::LeftBumper,
        Button::RightBumper,
        Button::DpadUp,
        Button::DpadDown,
        Button::DpadLeft,
        Button::DpadRight,
        Button::Back,
        Button::Start,
    ];
}

/// Analog stick; `y` is negative when pushed forward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Stick {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GamepadState {
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub y: bool,
    pub left_bumper: bool,
    pub right_bumper: bool,
    pub dpad_up: bool,
    pub dpad_down: bool,
    pub dpad_left: bool,
    pub dpad_right: bool,
    pub back: bool,
    pub start: bool,
    pub left_stick: Stick,
    pub right_stick: Stick,
    pub left_trigger: f32,
    pub right_trigger: f32,
}

impl GamepadState {
    pub fn is_pressed(
        &self,
        button: Button,
    ) -> bool {
        match button {
            Button::A => self.a,
            Button::B => self.b,
            Button::X => self.x,
            Button::Y => self.y,
            Button::LeftBumper => self.left_bumper,
            Button::RightBumper => self.right_bumper,
            Button::DpadUp => self.dpad_up,
            Button::DpadDown => self.dpad_down,
            Button::DpadLeft => self.dpad_left,
            Button::DpadRight => self.dpad_right,
            Button::Back => self.back,
            Button::Start => self.start,
        }
    }
}

/// Both gamepads as sampled on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Gamepads {
    pub driver: GamepadState,
    pub gunner: GamepadState,
}

impl Gamepads {
    pub fn get(
        &self,
        id: GamepadId,
    ) -> &GamepadState {
        match id {
            GamepadId::Driver => &self.driver,
            GamepadId::Gunner => &self.gunner,
        }
    }
}
