//! TUI rendering logic

use crate::app::App;
use crate::components::session_list;
use crate::theme;
use ccbrowse_core::{LoadStatus, SessionSource};
use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const KEY_HINTS: &str = "j/k move │ g group │ ⏎ fold │ a fold all │ f fav │ d delete │ J/K scroll │ r reload";

/// Draw the whole screen: list, transcript and status bar
pub fn render<S: SessionSource + 'static>(frame: &mut Frame, app: &App<S>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
        .split(rows[0]);

    let now = Local::now();
    app.controller.with_sessions(|sessions| {
        let list_rows = app.list.rows(sessions, &now);
        session_list::render(
            frame,
            panes[0],
            &list_rows,
            app.list.selected(),
            app.list.mode(),
            sessions.len(),
        );
    });

    let transcript = app.controller.transcript();
    app.transcript_view.render(
        frame,
        panes[1],
        transcript.as_ref(),
        &app.controller.transcript_status(),
        &app.highlighter,
    );

    render_status_bar(frame, rows[1], app);
}

fn render_status_bar<S: SessionSource + 'static>(frame: &mut Frame, area: Rect, app: &App<S>) {
    let status = app.controller.sessions_status();

    let line = if app.pending_delete.is_some() {
        Line::from(vec![
            Span::styled(" ? ", Style::default().fg(theme::FAVORITE).add_modifier(Modifier::BOLD)),
            Span::styled(
                app.status_message.clone().unwrap_or_default(),
                Style::default().fg(theme::FAVORITE),
            ),
        ])
    } else if let LoadStatus::Failed(message) = &status {
        Line::from(vec![
            Span::styled(" ✗ ", Style::default().fg(theme::ERROR).add_modifier(Modifier::BOLD)),
            Span::styled(message.clone(), Style::default().fg(theme::ERROR)),
            Span::styled("  r to retry", theme::muted()),
        ])
    } else {
        let left = match (&status, &app.status_message) {
            (LoadStatus::Loading, _) => " ⟳ Loading sessions... ".to_string(),
            (_, Some(message)) => format!(" ● {} ", message),
            (_, None) => " ● ready ".to_string(),
        };
        Line::from(vec![
            Span::styled(left, Style::default().fg(Color::White)),
            Span::styled("│", theme::muted()),
            Span::styled(" q", Style::default().fg(theme::FOCUS).add_modifier(Modifier::BOLD)),
            Span::styled(" quit ", theme::muted()),
            Span::styled("│", theme::muted()),
            Span::styled(format!(" {}", KEY_HINTS), theme::muted()),
        ])
    };

    frame.render_widget(
        Paragraph::new(line).style(Style::default().bg(Color::Black)),
        area,
    );
}
