/// Keyboard collector.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement while a key is held
///   - Edge-triggered actions (interact, inventory, pause, menu keys)
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.
///
/// Key map:
///   ←→↑↓ / WASD   move
///   Enter / Space interact (also starts from the menu)
///   I             inventory
///   P             pause / resume
///   Esc           close dialog / inventory / pause panel
///   R             restart (pause panel)
///   Q             back to menu (quit from the menu)
///   M             mute

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::input::MoveAxes;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];

/// One-shot actions shared by the keyboard and gamepad collectors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Interact,
    Inventory,
    Pause,
    Cancel,
    Restart,
    Menu,
    Mute,
    Quit,
}

pub fn key_action(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Interact),
        KeyCode::Char('i') | KeyCode::Char('I') => Some(Action::Inventory),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Action::Pause),
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Restart),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Menu),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(Action::Mute),
        _ => None,
    }
}

/// Movement axes from a held-key predicate.
fn axes_from(held: impl Fn(KeyCode) -> bool) -> MoveAxes {
    let any = |codes: &[KeyCode]| codes.iter().any(|c| held(*c));
    MoveAxes {
        left: any(KEYS_LEFT),
        right: any(KEYS_RIGHT),
        up: any(KEYS_UP),
        down: any(KEYS_DOWN),
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && (key.code == KeyCode::Char('c') || key.code == KeyCode::Char('C'))
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for Ctrl+C.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the engine frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // rely on timeout-based expiry instead
            }
            _ => {
                let was_held = self.is_held_at(key.code, now);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    pub fn axes(&self) -> MoveAxes {
        let now = Instant::now();
        axes_from(|c| self.is_held_at(c, now))
    }

    /// Actions freshly pressed during the last drain, in arrival order.
    pub fn actions(&self) -> Vec<Action> {
        if self.raw_events.iter().any(is_ctrl_c) {
            return vec![Action::Quit];
        }
        self.fresh_presses.iter().filter_map(|c| key_action(*c)).collect()
    }

    /// Any key at all arrived during the last drain.
    pub fn had_input(&self) -> bool {
        !self.raw_events.is_empty()
    }

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active
            .get(&code)
            .map(|t| now.saturating_duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}
