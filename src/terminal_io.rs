use std::collections::HashMap;
use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use log::{error, info};

use crate::field::InputState;

// Supplies one snapshot of the pressed controls per frame. Never blocks.
pub trait InputSource {
    fn snapshot(&mut self, frame: u64) -> io::Result<InputState>;
}

pub fn apply_event(input: &mut InputState, event: &Event) {
    let key = match event {
        Event::Key(key) => key,
        Event::Resize(width, height) => {
            info!("Terminal resized to {}x{}; the field keeps its size", width, height);
            return;
        }
        _ => return,
    };
    if key.kind == KeyEventKind::Release {
        return;
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('w') => input.forward = true,
        KeyCode::Down | KeyCode::Char('s') => input.backward = true,
        KeyCode::Left | KeyCode::Char('a') => input.left = true,
        KeyCode::Right | KeyCode::Char('d') => input.right = true,
        KeyCode::Char(' ') => input.fire = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => input.quit = true,
        KeyCode::Char('q') | KeyCode::Esc => input.quit = true,
        _ => {}
    }
}

// --- Keyboard input from the real terminal ---
#[derive(Default)]
pub struct TerminalInput;

impl InputSource for TerminalInput {
    fn snapshot(&mut self, _frame: u64) -> io::Result<InputState> {
        let mut input = InputState::default();
        while event::poll(Duration::ZERO).map_err(|e| { error!("Failed to poll event: {}", e); e })? {
            let event = event::read().map_err(|e| { error!("Failed to read event: {}", e); e })?;
            apply_event(&mut input, &event);
        }
        Ok(input)
    }
}

pub fn wait_for_key() -> io::Result<()> {
    loop {
        let event = event::read().map_err(|e| { error!("Failed to read event: {}", e); e })?;
        if let Event::Key(key) = event {
            if key.kind != KeyEventKind::Release {
                return Ok(());
            }
        }
    }
}

// --- SimulatedInput for headless runs ---
pub struct SimulatedInput {
    events: HashMap<u64, Vec<Event>>,
}

impl SimulatedInput {
    pub fn new(events: HashMap<u64, Vec<Event>>) -> Self {
        SimulatedInput { events }
    }

    pub fn from_keys(keys: &[(u64, KeyCode)]) -> Self {
        let mut events: HashMap<u64, Vec<Event>> = HashMap::new();
        for &(frame, code) in keys {
            events.entry(frame).or_default().push(Event::Key(code.into()));
        }
        SimulatedInput::new(events)
    }

    // Thrust, turn, fire a few volleys, then quit.
    pub fn demo() -> Self {
        let mut keys = Vec::new();
        for frame in 1..=10 {
            keys.push((frame, KeyCode::Up));
        }
        for frame in 11..=15 {
            keys.push((frame, KeyCode::Right));
        }
        for frame in (20..=90).step_by(10) {
            keys.push((frame, KeyCode::Char(' ')));
            keys.push((frame, KeyCode::Left));
        }
        keys.push((100, KeyCode::Char('q')));
        SimulatedInput::from_keys(&keys)
    }
}

impl InputSource for SimulatedInput {
    fn snapshot(&mut self, frame: u64) -> io::Result<InputState> {
        let mut input = InputState::default();
        if let Some(events) = self.events.remove(&frame) {
            for event in &events {
                apply_event(&mut input, event);
            }
        }
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    fn pressed(code: KeyCode) -> InputState {
        let mut input = InputState::default();
        apply_event(&mut input, &Event::Key(code.into()));
        input
    }

    #[test]
    fn arrow_keys_and_letters_map_to_controls() {
        assert!(pressed(KeyCode::Up).forward);
        assert!(pressed(KeyCode::Char('w')).forward);
        assert!(pressed(KeyCode::Down).backward);
        assert!(pressed(KeyCode::Left).left);
        assert!(pressed(KeyCode::Char('d')).right);
        assert!(pressed(KeyCode::Char(' ')).fire);
        assert!(pressed(KeyCode::Char('q')).quit);
        assert!(pressed(KeyCode::Esc).quit);
        assert_eq!(pressed(KeyCode::Char('x')), InputState::default());
    }

    #[test]
    fn ctrl_c_quits() {
        let mut input = InputState::default();
        let event = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        apply_event(&mut input, &event);
        assert!(input.quit);

        assert!(!pressed(KeyCode::Char('c')).quit);
    }

    #[test]
    fn key_release_is_ignored() {
        let mut input = InputState::default();
        let mut key = KeyEvent::from(KeyCode::Up);
        key.kind = KeyEventKind::Release;
        apply_event(&mut input, &Event::Key(key));
        assert!(!input.forward);
    }

    #[test]
    fn simulated_input_replays_each_frame_once() {
        let mut input = SimulatedInput::from_keys(&[(2, KeyCode::Up), (2, KeyCode::Char(' ')), (5, KeyCode::Char('q'))]);

        assert_eq!(input.snapshot(1).unwrap(), InputState::default());
        let frame_two = input.snapshot(2).unwrap();
        assert!(frame_two.forward && frame_two.fire);
        assert_eq!(input.snapshot(2).unwrap(), InputState::default());
        assert!(input.snapshot(5).unwrap().quit);
    }

    #[test]
    fn demo_script_ends_with_quit() {
        let mut input = SimulatedInput::demo();
        let quit_frame = (0..=200).find(|&frame| input.snapshot(frame).unwrap().quit);
        assert_eq!(quit_frame, Some(100));
    }
}
