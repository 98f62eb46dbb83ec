/// Gamepad collector using gilrs.
///
/// Button mapping comes from the `[gamepad]` section of config.toml.
/// Default mapping:
///   D-pad / Left Stick    →  Movement
///   A                     →  Interact
///   Y / X                 →  Inventory
///   Start                 →  Pause
///   B / Select            →  Close

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
#[cfg(feature = "gamepad")]
use tracing::{info, warn};

use crate::config::GamepadConfig;
use crate::domain::input::MoveAxes;

use super::input::Action;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER" => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping. A config entry with no recognizable
/// button name keeps the default for that action.
#[derive(Clone, Debug, PartialEq)]
struct ActionMap {
    interact: Vec<Btn>,
    inventory: Vec<Btn>,
    pause: Vec<Btn>,
    cancel: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            interact: vec![Btn::A],
            inventory: vec![Btn::Y, Btn::X],
            pause: vec![Btn::Start],
            cancel: vec![Btn::B, Btn::Select],
        }
    }
}

impl ActionMap {
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse_list(names: &[String], fallback: Vec<Btn>) -> Vec<Btn> {
            let btns: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if btns.is_empty() { fallback } else { btns }
        }
        let d = ActionMap::default();
        ActionMap {
            interact: parse_list(&cfg.interact, d.interact),
            inventory: parse_list(&cfg.inventory, d.inventory),
            pause: parse_list(&cfg.pause, d.pause),
            cancel: parse_list(&cfg.cancel, d.cancel),
        }
    }

    fn actions_for(&self, pressed: impl Fn(Btn) -> bool) -> Vec<Action> {
        let hit = |btns: &[Btn]| btns.iter().any(|b| pressed(*b));
        let mut out = Vec::new();
        if hit(&self.interact) { out.push(Action::Interact); }
        if hit(&self.inventory) { out.push(Action::Inventory); }
        if hit(&self.pause) { out.push(Action::Pause); }
        if hit(&self.cancel) { out.push(Action::Cancel); }
        out
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct Dpad {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BTN_COUNT],
    dpad: Dpad,
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new(cfg: &GamepadConfig) -> Self {
        let mut state = GamepadState::detached(ActionMap::from_config(cfg));

        #[cfg(feature = "gamepad")]
        match Gilrs::new() {
            Ok(g) => {
                state.connected = g.gamepads().next().is_some();
                info!(connected = state.connected, "gamepad support ready");
                state.gilrs = Some(g);
            }
            Err(e) => warn!(error = %e, "gamepad support unavailable"),
        }

        state
    }

    /// No backend attached: every query reports idle.
    fn detached(action_map: ActionMap) -> Self {
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad: Dpad::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            action_map,
            connected: false,
        }
    }

    pub fn update(&mut self) {
        for b in &mut self.buttons {
            b.just_pressed = false;
        }

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        // D-pad feeds movement only
        match gilrs_btn {
            Button::DPadUp => { self.dpad.up = held; return; }
            Button::DPadDown => { self.dpad.down = held; return; }
            Button::DPadLeft => { self.dpad.left = held; return; }
            Button::DPadRight => { self.dpad.right = held; return; }
            _ => {}
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            let state = &mut self.buttons[btn as usize];
            if held && !state.held {
                state.just_pressed = true;
            }
            state.held = held;
        }
    }

    /// Held movement from the D-pad or the left stick.
    pub fn axes(&self) -> MoveAxes {
        MoveAxes {
            left: self.dpad.left || self.stick_x < -STICK_DEADZONE,
            right: self.dpad.right || self.stick_x > STICK_DEADZONE,
            up: self.dpad.up || self.stick_y > STICK_DEADZONE,
            down: self.dpad.down || self.stick_y < -STICK_DEADZONE,
        }
    }

    /// Actions whose buttons went down since the last `update`.
    pub fn actions(&self) -> Vec<Action> {
        self.action_map.actions_for(|b| self.buttons[b as usize].just_pressed)
    }

    fn release_all(&mut self) {
        self.buttons = [BtnState::default(); BTN_COUNT];
        self.dpad = Dpad::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(interact: &[&str], pause: &[&str]) -> GamepadConfig {
        GamepadConfig {
            interact: interact.iter().map(|s| s.to_string()).collect(),
            inventory: vec![],
            pause: pause.iter().map(|s| s.to_string()).collect(),
            cancel: vec!["select".into()],
        }
    }

    #[test]
    fn button_names_are_case_insensitive() {
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("rb"), Some(Btn::R1));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn unknown_or_empty_entries_keep_defaults() {
        let m = ActionMap::from_config(&cfg(&["turbo"], &["X", "R1"]));
        assert_eq!(m.interact, vec![Btn::A]);
        assert_eq!(m.inventory, vec![Btn::Y, Btn::X]);
        assert_eq!(m.pause, vec![Btn::X, Btn::R1]);
        assert_eq!(m.cancel, vec![Btn::Select]);
    }

    #[test]
    fn one_button_can_trigger_several_actions() {
        let m = ActionMap::from_config(&cfg(&["A"], &["X"]));
        let acts = m.actions_for(|b| b == Btn::X);
        assert_eq!(acts, vec![Action::Inventory, Action::Pause]);
        assert!(m.actions_for(|_| false).is_empty());
    }

    #[test]
    fn stick_respects_deadzone() {
        let mut s = GamepadState::detached(ActionMap::default());
        s.stick_x = 0.2;
        s.stick_y = -0.9;
        assert_eq!(s.axes(), MoveAxes { left: false, right: false, up: false, down: true });
        s.release_all();
        assert!(!s.axes().any());
    }
}
