/// Input state tracker.
///
/// Everything in this game is edge-triggered: a flap, a menu choice, a
/// click. Terminals without Release events report a held key as a stream
/// of Press/Repeat events, so a key only counts as freshly pressed when it
/// was not seen within `HOLD_TIMEOUT`.
///
/// A left mouse click anywhere is the pointer flap.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    last_active: HashMap<KeyCode, Instant>,
    fresh_presses: Vec<KeyCode>,
    /// Raw key events from the latest drain, for Ctrl+C detection.
    raw_events: Vec<KeyEvent>,
    clicked: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            clicked: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.begin_frame();
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(ev) => self.record(ev, Instant::now()),
                Err(e) => {
                    tracing::debug!("terminal event read failed: {e}");
                    break;
                }
            }
        }
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
        self.clicked = false;
    }

    fn record(&mut self, ev: Event, now: Instant) {
        match ev {
            Event::Key(key) => {
                self.raw_events.push(key);
                if key.kind == KeyEventKind::Release {
                    self.last_active.remove(&key.code);
                    return;
                }
                let held = self
                    .last_active
                    .get(&key.code)
                    .is_some_and(|t| now.duration_since(*t) < HOLD_TIMEOUT);
                self.last_active.insert(key.code, now);
                if !held {
                    self.fresh_presses.push(key.code);
                }
            }
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                self.clicked = true;
            }
            _ => {}
        }
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Letter keys, either case.
    pub fn letter_pressed(&self, c: char) -> bool {
        self.was_pressed(KeyCode::Char(c.to_ascii_lowercase()))
            || self.was_pressed(KeyCode::Char(c.to_ascii_uppercase()))
    }

    pub fn clicked(&self) -> bool {
        self.clicked
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseEvent};

    fn key(code: KeyCode, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn held_key_fires_once() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.begin_frame();
        input.record(key(KeyCode::Char(' '), KeyEventKind::Press), t0);
        assert!(input.was_pressed(KeyCode::Char(' ')));

        input.begin_frame();
        input.record(key(KeyCode::Char(' '), KeyEventKind::Repeat), t0 + Duration::from_millis(30));
        assert!(!input.was_pressed(KeyCode::Char(' ')));
    }

    #[test]
    fn release_rearms_key() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.record(key(KeyCode::Up, KeyEventKind::Press), t0);
        input.record(key(KeyCode::Up, KeyEventKind::Release), t0);
        input.begin_frame();
        input.record(key(KeyCode::Up, KeyEventKind::Press), t0 + Duration::from_millis(10));
        assert!(input.was_pressed(KeyCode::Up));
    }

    #[test]
    fn left_click_is_recorded() {
        let mut input = InputState::new();
        input.record(
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: 3,
                row: 4,
                modifiers: KeyModifiers::NONE,
            }),
            Instant::now(),
        );
        assert!(input.clicked());
        input.begin_frame();
        assert!(!input.clicked());
    }

    #[test]
    fn letters_match_either_case() {
        let mut input = InputState::new();
        input.record(key(KeyCode::Char('P'), KeyEventKind::Press), Instant::now());
        assert!(input.letter_pressed('p'));
    }

    #[test]
    fn detects_ctrl_c() {
        let mut input = InputState::new();
        input.record(
            Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Instant::now(),
        );
        assert!(input.ctrl_c_pressed());
    }
}
