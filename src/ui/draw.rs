use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use super::app::PickerState;

const PICKER_HELP: &str = "Type to filter  Up/Down: move  Enter: select  Esc: cancel";

pub fn render<B: Backend>(terminal: &mut Terminal<B>, state: &PickerState) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, state))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, state: &PickerState) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_filter(frame, layout[0], state);
    draw_list(frame, layout[1], state);
    draw_footer(frame, layout[2], state);
}

fn draw_filter(frame: &mut Frame<'_>, area: Rect, state: &PickerState) {
    let label = format!("{}> ", state.prompt);
    let label_width = Span::raw(label.as_str()).width();
    let line = Line::from(vec![
        Span::styled(label, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(state.filter.value().to_string()),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    let x = area
        .x
        .saturating_add((label_width + state.filter.visual_cursor()) as u16);
    frame.set_cursor_position((x, area.y));
}

fn draw_list(frame: &mut Frame<'_>, area: Rect, state: &PickerState) {
    let items: Vec<ListItem> = if state.visible_len() == 0 {
        vec![ListItem::new(Line::from(Span::styled(
            "No matches",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        state
            .visible_rows()
            .map(|row| ListItem::new(Line::from(row.to_string())))
            .collect()
    };

    let mut list_state = ListState::default();
    list_state.select(state.selected_row());

    let list = List::new(items)
        .block(Block::default().borders(Borders::TOP))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut list_state);
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, state: &PickerState) {
    let counts = format!("{}/{}  ", state.visible_len(), state.total());
    let line = Line::from(vec![
        Span::styled(counts, Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(PICKER_HELP, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
