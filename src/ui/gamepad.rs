/// Gamepad input via gilrs (feature `gamepad`).
///
/// D-pad and left stick both feed the four held directions. Action
/// buttons come from the `[gamepad]` section of config.toml:
///   interact → A      music → Start      quit → Select
///
/// Without the feature every query reports "nothing pressed".

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
#[cfg(feature = "gamepad")]
use tracing::{info, warn};

use crate::config::GamepadConfig;
use crate::domain::direction::{Direction, HeldDirections};

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Face and shoulder buttons that can carry an action.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,
    B,
    X,
    Y,
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
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
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

/// Action → buttons. Unknown names are skipped; an empty list keeps the
/// default binding.
#[derive(Clone, Debug, PartialEq)]
struct ActionMap {
    interact: Vec<Btn>,
    music: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            interact: vec![Btn::A],
            music: vec![Btn::Start],
            quit: vec![Btn::Select],
        }
    }
}

impl ActionMap {
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse_or(names: &[String], fallback: Vec<Btn>) -> Vec<Btn> {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if parsed.is_empty() { fallback } else { parsed }
        }
        let d = ActionMap::default();
        ActionMap {
            interact: parse_or(&cfg.interact, d.interact),
            music: parse_or(&cfg.music, d.music),
            quit: parse_or(&cfg.quit, d.quit),
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Held flag per `Btn`, and whether it went down this frame.
    held: [bool; BTN_COUNT],
    just_pressed: [bool; BTN_COUNT],

    /// D-pad, indexed like `Direction::index`.
    dpad: [bool; 4],
    stick_x: f32,
    stick_y: f32,

    actions: ActionMap,
    pub connected: bool,
}

impl GamepadState {
    pub fn new(cfg: &GamepadConfig) -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                info!(connected = has_pad, "gamepad backend ready");
                (Some(g), has_pad)
            }
            Err(e) => {
                warn!(error = %e, "gamepad backend unavailable");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs,
            held: [false; BTN_COUNT],
            just_pressed: [false; BTN_COUNT],
            dpad: [false; 4],
            stick_x: 0.0,
            stick_y: 0.0,
            actions: ActionMap::from_config(cfg),
            connected,
        }
    }

    /// Poll pending gamepad events. Call once per frame.
    pub fn update(&mut self) {
        self.just_pressed = [false; BTN_COUNT];

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let Some(gilrs) = self.gilrs.as_mut() else { return };
        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => self.set_button(btn, true),
                EventType::ButtonReleased(btn, _) => self.set_button(btn, false),
                EventType::AxisChanged(Axis::LeftStickX, value, _) => self.stick_x = value,
                EventType::AxisChanged(Axis::LeftStickY, value, _) => self.stick_y = value,
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
    fn set_button(&mut self, btn: Button, down: bool) {
        self.connected = true;
        let dpad = match btn {
            Button::DPadUp => Some(Direction::Up),
            Button::DPadDown => Some(Direction::Down),
            Button::DPadLeft => Some(Direction::Left),
            Button::DPadRight => Some(Direction::Right),
            _ => None,
        };
        if let Some(dir) = dpad {
            self.dpad[dir.index()] = down;
        } else if let Some(b) = Btn::from_gilrs(btn) {
            self.press(b, down);
        }
    }

    fn press(&mut self, btn: Btn, down: bool) {
        let i = btn as usize;
        if down && !self.held[i] {
            self.just_pressed[i] = true;
        }
        self.held[i] = down;
    }

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.just_pressed[b as usize])
    }

    pub fn interact_pressed(&self) -> bool {
        self.any_just_pressed(&self.actions.interact)
    }

    pub fn music_pressed(&self) -> bool {
        self.any_just_pressed(&self.actions.music)
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_just_pressed(&self.actions.quit)
    }

    /// Stick past the dead zone counts the same as the D-pad.
    pub fn held_directions(&self) -> HeldDirections {
        let stick = |dir: Direction| match dir {
            Direction::Left => self.stick_x < -STICK_DEADZONE,
            Direction::Right => self.stick_x > STICK_DEADZONE,
            Direction::Up => self.stick_y > STICK_DEADZONE,
            Direction::Down => self.stick_y < -STICK_DEADZONE,
        };
        let mut held = HeldDirections::NONE;
        for dir in Direction::ALL {
            held.set(dir, self.dpad[dir.index()] || stick(dir));
        }
        held
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.held = [false; BTN_COUNT];
        self.dpad = [false; 4];
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}
