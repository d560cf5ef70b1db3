//! Left pane: sessions, flat or under collapsible group headers

use crate::theme;
use ccbrowse_core::models::{Session, SessionId};
use ccbrowse_core::{GroupMode, ListRow};
use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Render the session list
///
/// `rows` comes from `SessionListController::rows`; the row holding
/// `selected` is highlighted and kept in view.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    rows: &[ListRow<'_>],
    selected: Option<&SessionId>,
    mode: GroupMode,
    total: usize,
) {
    let indent = if mode.is_grouped() { "  " } else { "" };
    let items: Vec<ListItem> = rows.iter().map(|row| ListItem::new(row_line(row, indent))).collect();

    let mut state = ListState::default();
    state.select(selected_row(rows, selected));

    let title = format!(" Sessions ({}) · group: {} ", total, mode);
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(theme::FOCUS)),
        )
        .highlight_style(theme::selected());

    frame.render_stateful_widget(list, area, &mut state);
}

/// Position of the selected session among the display rows
pub fn selected_row(rows: &[ListRow<'_>], selected: Option<&SessionId>) -> Option<usize> {
    let selected = selected?;
    rows.iter()
        .position(|row| matches!(row, ListRow::Session(s) if &s.id == selected))
}

fn row_line(row: &ListRow<'_>, indent: &str) -> Line<'static> {
    match row {
        ListRow::Header {
            key,
            total,
            collapsed,
        } => {
            let marker = if *collapsed { "▸" } else { "▾" };
            Line::from(vec![
                Span::styled(format!("{} {}", marker, key), theme::group_header()),
                Span::styled(format!(" ({})", total), theme::muted()),
            ])
        }
        ListRow::Session(session) => session_line(session, indent),
    }
}

fn session_line(session: &Session, indent: &str) -> Line<'static> {
    let star = if session.is_favorite {
        Span::styled("★ ", Style::default().fg(theme::FAVORITE))
    } else {
        Span::raw("  ")
    };

    Line::from(vec![
        Span::raw(indent.to_string()),
        star,
        Span::raw(session.title().to_string()),
        Span::styled(format!("  {}", modified_label(session.modified_time)), theme::muted()),
    ])
}

fn modified_label(modified_secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(modified_secs, 0)
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
