//! Layout and rendering.
//!
//! The screen is the key tree on the left, the value viewer on the right and
//! a one-line status bar at the bottom. The open overlay, if any, is drawn
//! last on top of everything.

use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use super::app::{App, AppState, Focus, Pane};
use super::overlay::{
    CommandPalette, ConfirmChoice, ConfirmDialog, HelpPanel, InputDialog, Overlay,
};
use super::widgets::{
    centered_fixed, centered_rect, dialog_text, status_color, DialogFrame, EditorView,
    KeyTreeView, ValueView,
};

/// Top-level rendering function.
pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Panes
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_panes(f, app, chunks[0]);
    draw_status_bar(f, app, chunks[1]);

    if app.state() == AppState::Error {
        draw_error(f, app, chunks[0]);
    }

    match app.overlay() {
        Some(Overlay::Confirm(dialog)) => draw_confirm(f, dialog),
        Some(Overlay::Input(dialog)) => draw_input(f, dialog),
        Some(Overlay::Palette(palette)) => draw_palette(f, palette),
        Some(Overlay::Help(help)) => draw_help(f, help),
        Some(Overlay::Editor(editor)) => EditorView::new(editor).render(f, chunks[0]),
        None => {}
    }
}

// ── Panes ───────────────────────────────────────────────────────────────────

fn draw_panes(f: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let focus = app.focus();
    let filter = app
        .filter_input()
        .map(|input| input.value())
        .or(Some(app.tree().filter()));

    if app.state() == AppState::Connecting {
        let text = Paragraph::new(Line::from(Span::styled(
            format!("Connecting to {}...", app.addr()),
            Style::default().fg(Color::Yellow),
        )));
        f.render_widget(
            text.block(Block::bordered().title(" Keys ")),
            columns[0],
        );
    } else {
        KeyTreeView::new(app.tree(), focus == Focus::KeyList || focus == Focus::Filter)
            .with_filter(filter)
            .render(f, columns[0]);
    }

    ValueView::new(app.viewer(), focus == Focus::Viewer).render(f, columns[1]);
}

fn draw_error(f: &mut Frame, app: &App, area: Rect) {
    let rect = centered_fixed(60, 7, area);
    let inner = DialogFrame::new("Connection failed")
        .with_color(Color::Red)
        .render(f, rect);
    let lines = vec![
        Line::from(app.last_error().unwrap_or("unknown error")),
        Line::from(""),
        Line::from(Span::styled(
            "r: retry   q: quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(dialog_text(lines), inner);
}

// ── Status Bar ──────────────────────────────────────────────────────────────

fn state_badge(app: &App) -> Span<'static> {
    let bg = match app.state() {
        AppState::Connecting | AppState::Loading => Color::Yellow,
        AppState::Connected | AppState::Ready => Color::Green,
        AppState::Error => Color::Red,
    };
    Span::styled(
        format!(" {} ", app.state().name().to_uppercase()),
        Style::default()
            .fg(Color::Black)
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    )
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![state_badge(app), Span::raw(format!(" {} ", app.addr()))];

    if let Some(filter) = app.filter_input() {
        spans.push(Span::styled(
            format!("/{}", filter.value()),
            Style::default().fg(Color::Cyan),
        ));
        spans.push(Span::styled(
            "  Enter:keep  Esc:clear",
            Style::default().fg(Color::DarkGray),
        ));
        let cursor_x = area.x
            + spans[..2].iter().map(|s| s.width() as u16).sum::<u16>()
            + 1
            + filter.cursor() as u16;
        f.render_widget(Paragraph::new(Line::from(spans)), area);
        f.set_cursor_position(Position::new(cursor_x.min(area.right().saturating_sub(1)), area.y));
        return;
    }

    if let Some(status) = app.status() {
        spans.push(Span::styled(
            status.text.clone(),
            Style::default().fg(status_color(status.level)),
        ));
    } else if let Some(banner) = app.banner() {
        spans.push(Span::styled(banner.to_string(), Style::default().fg(Color::Yellow)));
    } else {
        let hints = match app.pane() {
            Pane::KeyList => " Enter:open  Space:select  /:filter  n:new  d:delete  e:edit  ^P:commands  ?:help  q:quit ",
            Pane::Viewer => " J/H/T/A:mode  e:edit  c:copy  Esc:back  ?:help  q:quit ",
        };
        spans.push(Span::styled(hints, Style::default().fg(Color::DarkGray)));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ── Overlays ────────────────────────────────────────────────────────────────

fn draw_confirm(f: &mut Frame, dialog: &ConfirmDialog) {
    let rect = centered_fixed(50, 7, f.area());
    let inner = DialogFrame::new(&dialog.title)
        .with_color(Color::Red)
        .render(f, rect);

    let button = |label: &'static str, choice: ConfirmChoice| {
        let style = if dialog.focus() == choice {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        Span::styled(format!(" {} ", label), style)
    };

    let lines = vec![
        Line::from(dialog.message.as_str()),
        Line::from(""),
        Line::from(vec![
            button("Yes", ConfirmChoice::Yes),
            Span::raw("   "),
            button("No", ConfirmChoice::No),
        ]),
    ];
    f.render_widget(dialog_text(lines), inner);
}

fn draw_input(f: &mut Frame, dialog: &InputDialog) {
    let rect = centered_fixed(60, 6, f.area());
    let inner = DialogFrame::new(&dialog.title).render(f, rect);

    let value = if dialog.value().is_empty() {
        Span::styled(dialog.placeholder.clone(), Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(dialog.value().to_string())
    };
    let mut lines = vec![Line::from(vec![Span::raw("> "), value])];
    match dialog.error() {
        Some(error) => lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        ))),
        None => lines.push(Line::from(Span::styled(
            "Enter:submit  Esc:cancel",
            Style::default().fg(Color::DarkGray),
        ))),
    }
    f.render_widget(dialog_text(lines), inner);

    let x = inner.x + 2 + dialog.input().cursor() as u16;
    f.set_cursor_position(Position::new(x.min(inner.right().saturating_sub(1)), inner.y));
}

fn draw_palette(f: &mut Frame, palette: &CommandPalette) {
    let rows = palette.matches().count().max(1) as u16;
    let rect = centered_fixed(60, rows + 4, f.area());
    let inner = DialogFrame::new("Commands").render(f, rect);

    let mut lines = vec![
        Line::from(vec![Span::raw("> "), Span::raw(palette.query().to_string())]),
        Line::from(""),
    ];
    if palette.matches().next().is_none() {
        lines.push(Line::from(Span::styled(
            "No matching commands",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (index, command) in palette.matches().enumerate() {
        let style = if index == palette.selected() {
            Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<16}", command.name), style.fg(Color::Cyan)),
            Span::styled(format!("{:<6}", command.shortcut), style.fg(Color::Yellow)),
            Span::styled(command.description, style.fg(Color::Gray)),
        ]));
    }
    f.render_widget(Paragraph::new(lines), inner);

    let x = inner.x + 2 + palette.query().chars().count() as u16;
    f.set_cursor_position(Position::new(x.min(inner.right().saturating_sub(1)), inner.y));
}

fn draw_help(f: &mut Frame, help: &HelpPanel) {
    let rect = centered_rect(70, 80, f.area());
    let inner = DialogFrame::new("Help").render(f, rect);
    let lines: Vec<Line> = HelpPanel::lines()
        .into_iter()
        .skip(help.scroll())
        .map(|l| {
            if l.starts_with(' ') {
                Line::from(l)
            } else {
                Line::from(Span::styled(
                    l,
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ))
            }
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::message::Message;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use memtui_core::{Config, EnumerationOutcome, KeyRecord, MemtuiError};
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &App) -> String {
        let backend = TestBackend::new(100, 20);
        let mut terminal = Terminal::new(backend).expect("failed to create terminal");
        terminal.draw(|f| draw(f, app)).expect("failed to draw");
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn key(code: KeyCode) -> Message {
        Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn app_with_keys() -> App {
        let mut app = App::new(Config::default());
        app.update(Message::Resize(100, 20));
        app.update(Message::KeysLoaded {
            outcome: EnumerationOutcome::complete(vec![
                KeyRecord::bare("user:1"),
                KeyRecord::bare("user:2"),
            ]),
            warning: None,
        });
        app
    }

    #[test]
    fn test_draw_connecting() {
        let mut app = App::new(Config::default());
        app.init();
        let text = render(&app);
        assert!(text.contains("Connecting to 127.0.0.1:11211"));
        assert!(text.contains("CONNECTING"));
    }

    #[test]
    fn test_draw_error_state() {
        let mut app = App::new(Config::default());
        app.update(Message::ConnectionFailed(MemtuiError::Connection(
            "refused".into(),
        )));
        let text = render(&app);
        assert!(text.contains("Connection failed"));
        assert!(text.contains("r: retry"));
    }

    #[test]
    fn test_draw_tree_and_hints() {
        let app = app_with_keys();
        let text = render(&app);
        assert!(text.contains("Keys (2)"));
        assert!(text.contains("user/"));
        assert!(text.contains("READY"));
        assert!(text.contains("Select a key and press Enter"));
    }

    #[test]
    fn test_draw_overlays() {
        let mut app = app_with_keys();
        app.update(key(KeyCode::Char('?')));
        assert!(render(&app).contains("Help"));
        app.update(key(KeyCode::Esc));

        app.update(Message::Key(KeyEvent::new(
            KeyCode::Char('p'),
            KeyModifiers::CONTROL,
        )));
        assert!(render(&app).contains("Commands"));
        app.update(key(KeyCode::Esc));

        app.update(key(KeyCode::Char('n')));
        assert!(render(&app).contains("New key name"));
    }

    #[test]
    fn test_draw_filter_line() {
        let mut app = app_with_keys();
        app.update(key(KeyCode::Char('/')));
        app.update(key(KeyCode::Char('2')));
        let text = render(&app);
        assert!(text.contains("/2"));
        assert!(text.contains("Keys (1) [/2]"));
    }
}
