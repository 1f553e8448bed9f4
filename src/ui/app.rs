use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::picker::Picker;
use crate::search;

use super::draw;
use super::edit::FilterInput;

/// What a key press did to the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    /// Index into the original candidate list.
    Chosen(usize),
    Cancelled,
}

/// Candidate list, filter text and cursor for one picker prompt.
pub struct PickerState {
    pub prompt: String,
    candidates: Vec<String>,
    normalized: Vec<String>,
    pub filter: FilterInput,
    visible: Vec<usize>,
    selected: usize,
}

impl PickerState {
    pub fn new(prompt: &str, candidates: &[String]) -> Self {
        Self {
            prompt: prompt.to_string(),
            candidates: candidates.to_vec(),
            normalized: candidates.iter().map(|c| search::normalize(c)).collect(),
            filter: FilterInput::default(),
            visible: (0..candidates.len()).collect(),
            selected: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.candidates.len()
    }

    /// Candidates that pass the current filter, in original order.
    pub fn visible_rows(&self) -> impl Iterator<Item = &str> {
        self.visible.iter().map(|&idx| self.candidates[idx].as_str())
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Row of the highlighted candidate within `visible_rows`.
    pub fn selected_row(&self) -> Option<usize> {
        if self.visible.is_empty() {
            None
        } else {
            Some(self.selected)
        }
    }

    pub fn selected_candidate(&self) -> Option<usize> {
        self.visible.get(self.selected).copied()
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.visible.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.visible.len() as isize - 1;
        self.selected = (self.selected as isize + delta).clamp(0, last) as usize;
    }

    fn refilter(&mut self) {
        let query = search::normalize_query(self.filter.value());
        self.visible = match query {
            None => (0..self.candidates.len()).collect(),
            Some(query) => self
                .normalized
                .iter()
                .enumerate()
                .filter(|(_, hay)| search::matches_terms(hay, &query))
                .map(|(idx, _)| idx)
                .collect(),
        };
        self.selected = 0;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return KeyOutcome::Cancelled,
            KeyCode::Char('c') | KeyCode::Char('g') if ctrl => return KeyOutcome::Cancelled,
            KeyCode::Enter => {
                return match self.selected_candidate() {
                    Some(idx) => KeyOutcome::Chosen(idx),
                    None => KeyOutcome::Continue,
                };
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Char('p') if ctrl => self.move_selection(-1),
            KeyCode::Char('n') if ctrl => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-10),
            KeyCode::PageDown => self.move_selection(10),
            KeyCode::Char('u') if ctrl => {
                self.filter.reset();
                self.refilter();
            }
            _ => {
                if self.filter.handle_key_event(key) {
                    self.refilter();
                }
            }
        }
        KeyOutcome::Continue
    }
}

/// Full-screen picker drawn in the terminal's alternate screen.
#[derive(Debug, Default)]
pub struct TuiPicker;

impl TuiPicker {
    pub fn new() -> Self {
        Self
    }

    fn event_loop<B>(&self, terminal: &mut Terminal<B>, state: &mut PickerState) -> Result<Option<usize>>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            draw::render(terminal, state)?;

            if !event::poll(Duration::from_millis(250))? {
                continue;
            }
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match state.handle_key(key) {
                    KeyOutcome::Continue => {}
                    KeyOutcome::Chosen(idx) => return Ok(Some(idx)),
                    KeyOutcome::Cancelled => return Ok(None),
                }
            }
        }
    }
}

impl Picker for TuiPicker {
    fn pick(&mut self, prompt: &str, candidates: &[String]) -> Result<Option<usize>> {
        if candidates.is_empty() {
            return Ok(None);
        }
        let mut state = PickerState::new(prompt, candidates);

        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal, &mut state);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }
}
