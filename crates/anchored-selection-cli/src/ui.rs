use std::ops::Range;

use anchored_selection_engine::{EditingSurface, View};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

pub fn ui(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(rows[0]);

    for (pane, area) in app.panes().into_iter().zip(panes.iter()) {
        if let Ok(view) = app.workspace().view(pane) {
            render_pane(f, app, view, *area);
        }
    }

    render_status(f, app, rows[1]);
}

fn render_pane(f: &mut Frame, app: &App, view: &View, area: Rect) {
    let active = view.id() == app.active_view();
    let anchored = app.indicator().is_anchored(view.id());
    let (name, text) = match app.workspace().buffer(view.buffer_id()) {
        Ok(buffer) => (pane_title(buffer.name(), buffer.version()), buffer.text()),
        Err(_) => return,
    };

    let border_style = if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let title = Line::from(vec![
        Span::raw(format!(" {name} ")),
        indicator_span(app, anchored),
        Span::raw(" "),
    ]);

    let lines = pane_lines(&text, active.then(|| view.caret()), view.selection());
    let scroll = caret_line(&text, view.caret()).saturating_sub(area.height.saturating_sub(3) as usize);
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        )
        .scroll((scroll.min(u16::MAX as usize) as u16, 0));

    f.render_widget(paragraph, area);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let view = app.active_view();
    let anchored = app.indicator().is_anchored(view);
    let mut status = vec![
        indicator_span(app, anchored),
        Span::raw(format!(" {} ", app.indicator().tooltip())),
        Span::raw(format!("| {view} caret {} ", app.active().caret())),
    ];
    if let Some(clipboard) = app.clipboard() {
        status.push(Span::raw(format!(
            "| clipboard {} chars ",
            clipboard.chars().count()
        )));
    }
    if let Some(message) = app.message() {
        status.push(Span::styled(
            format!("| {message}"),
            Style::default().fg(Color::Yellow),
        ));
    }

    let help = Line::from(vec![
        Span::raw("C-Space: Anchor | "),
        Span::raw("Esc: Raise | "),
        Span::raw("C-c: Copy | "),
        Span::raw("Tab: Pane | "),
        Span::raw("F2: Scratch | "),
        Span::raw("C-q: Quit"),
    ]);

    f.render_widget(Paragraph::new(vec![Line::from(status), help]), area);
}

/// Buffer name, starred once the buffer has been edited
fn pane_title(name: &str, version: u64) -> String {
    if version > 0 {
        format!("{name}*")
    } else {
        name.to_string()
    }
}

/// Anchored state is shown bold, the idle state dimmed
fn indicator_span(app: &App, anchored: bool) -> Span<'static> {
    let style = if anchored {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(app.indicator().label(anchored).to_string(), style)
}

/// Lines of a pane with the selection highlighted and the caret reversed
fn pane_lines(
    text: &str,
    caret: Option<usize>,
    selection: Option<Range<usize>>,
) -> Vec<Line<'static>> {
    let caret_style = Style::default().add_modifier(Modifier::REVERSED);
    let selected_style = Style::default().bg(Color::Blue).fg(Color::White);
    let style_at = |offset: usize| {
        if caret == Some(offset) {
            caret_style
        } else if selection
            .as_ref()
            .is_some_and(|selection| selection.contains(&offset))
        {
            selected_style
        } else {
            Style::default()
        }
    };

    let mut lines = Vec::new();
    let mut spans = Vec::new();
    for (offset, ch) in text.char_indices() {
        if ch == '\n' {
            if caret == Some(offset) {
                spans.push(Span::styled(" ", caret_style));
            }
            lines.push(Line::from(std::mem::take(&mut spans)));
        } else {
            spans.push(Span::styled(ch.to_string(), style_at(offset)));
        }
    }
    if caret == Some(text.len()) {
        spans.push(Span::styled(" ", caret_style));
    }
    lines.push(Line::from(spans));
    lines
}

fn caret_line(text: &str, caret: usize) -> usize {
    text.get(..caret)
        .map(|before| before.matches('\n').count())
        .unwrap_or(0)
}
