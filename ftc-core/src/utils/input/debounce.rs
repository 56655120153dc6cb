//! Edge detection for gamepad buttons.
//!
//! A physical press spans many ticks. The debouncer latches each control while
//! it is held and reports it as pressed only on the tick it went down.

use hashbrown::{HashMap, HashSet};

use super::{Button, GamepadId, Gamepads};

/// A button on a specific gamepad.
pub type Control = (GamepadId, Button);

#[derive(Debug, Default)]
pub struct Debouncer {
    latched: HashMap<Control, bool>,
    pressed: HashSet<Control>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this tick's level state and compute the new presses.
    pub fn sample(
        &mut self,
        pads: &Gamepads,
    ) {
        self.pressed.clear();
        for id in [GamepadId::Driver, GamepadId::Gunner] {
            let pad = pads.get(id);
            for button in Button::ALL {
                let level = pad.is_pressed(button);
                let latch = self.latched.entry((id, button)).or_insert(false);
                if level && !*latch {
                    self.pressed.insert((id, button));
                }
                *latch = level;
            }
        }
    }

    /// Went down on the last sampled tick.
    pub fn pressed(
        &self,
        id: GamepadId,
        button: Button,
    ) -> bool {
        self.pressed.contains(&(id, button))
    }

    /// Still held since an earlier press.
    pub fn is_latched(
        &self,
        id: GamepadId,
        button: Button,
    ) -> bool {
        self.latched.get(&(id, button)).copied().unwrap_or(false)
    }

    /// All controls pressed on the last sampled tick.
    pub fn events(&self) -> impl Iterator<Item = &Control> {
        self.pressed.iter()
    }
}
