/// Keyboard hold tracker.
///
/// Terminals report key presses and auto-repeats, and only some report
/// releases. Without releases a key counts as held while its events keep
/// arriving: `repeat_delay` covers the gap between the first press and
/// the first auto-repeat, `hold_timeout` the gap between repeats. On
/// terminals with keyboard enhancement an explicit Release ends the hold
/// at once.
///
/// Logical directions OR together the arrow keys and WASD.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::direction::{Direction, HeldDirections};

const UP_KEYS: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const DOWN_KEYS: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const LEFT_KEYS: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT_KEYS: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];

pub const INTERACT_KEYS: &[KeyCode] = &[KeyCode::Char('z'), KeyCode::Char('Z')];
pub const MUSIC_KEYS: &[KeyCode] = &[KeyCode::Char('m'), KeyCode::Char('M')];
pub const QUIT_KEYS: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub fn direction_keys(dir: Direction) -> &'static [KeyCode] {
    match dir {
        Direction::Up => UP_KEYS,
        Direction::Down => DOWN_KEYS,
        Direction::Left => LEFT_KEYS,
        Direction::Right => RIGHT_KEYS,
    }
}

#[derive(Clone, Copy, Debug)]
struct KeyHold {
    last: Instant,
    /// Set once a second event arrives for the same hold.
    repeating: bool,
}

pub struct KeyboardState {
    holds: HashMap<KeyCode, KeyHold>,
    /// Keys that went from released to held during the last drain.
    fresh_presses: Vec<KeyCode>,
    ctrl_c: bool,
    hold_timeout: Duration,
    repeat_delay: Duration,
    /// Only true once keyboard enhancement is confirmed.
    pub honor_release: bool,
}

impl KeyboardState {
    pub fn new(hold_timeout_ms: u64, repeat_delay_ms: u64) -> Self {
        KeyboardState {
            holds: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            ctrl_c: false,
            hold_timeout: Duration::from_millis(hold_timeout_ms),
            repeat_delay: Duration::from_millis(repeat_delay_ms),
            honor_release: false,
        }
    }

    /// Drain every pending terminal event without blocking.
    /// Call once per frame, before the scene update.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.ctrl_c = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }
        self.expire(Instant::now());
    }

    fn record(&mut self, key: KeyEvent, at: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.ctrl_c = true;
            return;
        }
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.holds.remove(&key.code);
            }
            // Unconfirmed releases are ignored; the timeout ends the hold.
            KeyEventKind::Release => {}
            _ => {
                let repeating = self.is_held_at(key.code, at);
                if !repeating {
                    self.fresh_presses.push(key.code);
                }
                self.holds.insert(key.code, KeyHold { last: at, repeating });
            }
        }
    }

    /// How long a hold survives without a new event.
    fn window(&self, hold: &KeyHold) -> Duration {
        if hold.repeating { self.hold_timeout } else { self.repeat_delay }
    }

    fn expire(&mut self, now: Instant) {
        let (timeout, delay) = (self.hold_timeout, self.repeat_delay);
        self.holds.retain(|_, h| {
            let window = if h.repeating { timeout } else { delay };
            now.duration_since(h.last) < window
        });
    }

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.holds.get(&code)
            .is_some_and(|h| now.duration_since(h.last) < self.window(h))
    }

    fn any_held_at(&self, codes: &[KeyCode], now: Instant) -> bool {
        codes.iter().any(|c| self.is_held_at(*c, now))
    }

    /// Edge trigger: freshly pressed during the last drain.
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.ctrl_c
    }

    pub fn held_directions(&self) -> HeldDirections {
        self.held_directions_at(Instant::now())
    }

    fn held_directions_at(&self, now: Instant) -> HeldDirections {
        let mut held = HeldDirections::NONE;
        for dir in Direction::ALL {
            held.set(dir, self.any_held_at(direction_keys(dir), now));
        }
        held
    }
}
