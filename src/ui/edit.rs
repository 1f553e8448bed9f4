use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

/// Single-line filter box above the candidate list.
#[derive(Default)]
pub struct FilterInput {
    input: Input,
}

impl FilterInput {
    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn visual_cursor(&self) -> usize {
        self.input.visual_cursor()
    }

    pub fn reset(&mut self) {
        self.input.reset();
    }

    /// Returns true when the key was consumed by the input.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        self.input.handle_event(&Event::Key(key)).is_some()
    }
}
