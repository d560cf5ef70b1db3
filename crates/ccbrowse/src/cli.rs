//! Terminal output for the `list` and `show` commands

use ccbrowse_core::models::{RenderableBlock, Session, SessionId, Transcript};
use ccbrowse_core::{displayable_messages, group_sessions, DisplayMessage, GroupMode};
use chrono::{DateTime, Local, TimeZone, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use serde::Serialize;

const SUMMARY_WIDTH: usize = 60;

// ============================================================================
// Session lists
// ============================================================================

/// Sessions as one table, or one table per group when `mode` groups them
pub fn format_sessions<Tz>(
    sessions: &[Session],
    mode: GroupMode,
    now: &DateTime<Tz>,
    no_color: bool,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if sessions.is_empty() {
        return "No sessions found.".to_string();
    }

    if !mode.is_grouped() {
        let all: Vec<&Session> = sessions.iter().collect();
        return format_session_table(&all, no_color);
    }

    group_sessions(sessions, mode, now)
        .iter()
        .map(|group| {
            format!(
                "▾ {} ({})\n{}",
                group.key,
                group.sessions.len(),
                format_session_table(&group.sessions, no_color)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Sessions as pretty JSON in the `GET /api/sessions` shape
pub fn format_sessions_json(sessions: &[Session]) -> String {
    serde_json::to_string_pretty(&serde_json::json!({ "sessions": sessions }))
        .unwrap_or_else(|_| r#"{"sessions":[]}"#.to_string())
}

fn format_session_table(sessions: &[&Session], no_color: bool) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let headers = ["ID", "", "Modified", "Size", "Project", "Summary"];
    if no_color {
        table.set_header(headers.to_vec());
    } else {
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }

    for session in sessions {
        let id_short: String = session.id.chars().take(8).collect();
        let star = if session.is_favorite { "★" } else { "" };
        table.add_row(Row::from(vec![
            id_short,
            star.to_string(),
            format_mtime(session.modified_time),
            session.size_display(),
            shorten_project(&session.project),
            truncate(session.title(), SUMMARY_WIDTH),
        ]));
    }

    table.to_string()
}

// ============================================================================
// Transcripts
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptJson<'a> {
    session_id: &'a SessionId,
    summary: &'a str,
    messages: Vec<DisplayMessage>,
}

/// A transcript as readable text, one section per displayable message
pub fn format_transcript(transcript: &Transcript) -> String {
    let messages = displayable_messages(&transcript.entries);

    let mut lines = vec![format!("Session: {}", transcript.session_id)];
    if !transcript.summary.is_empty() {
        lines.push(format!("Summary: {}", transcript.summary));
    }
    lines.push(format!("Messages: {}", messages.len()));

    for message in &messages {
        lines.push(String::new());
        if message.timestamp.is_empty() {
            lines.push(format!("── {} ──", message.role.as_str()));
        } else {
            lines.push(format!("── {} · {} ──", message.role.as_str(), message.timestamp));
        }
        for block in &message.blocks {
            match block {
                RenderableBlock::Text { text } => lines.push(text.clone()),
                RenderableBlock::Image { url } => lines.push(format!("[image: {}]", url)),
            }
        }
    }

    lines.join("\n")
}

/// A transcript's normalized messages as pretty JSON
pub fn format_transcript_json(transcript: &Transcript) -> String {
    let body = TranscriptJson {
        session_id: &transcript.session_id,
        summary: &transcript.summary,
        messages: displayable_messages(&transcript.entries),
    };
    serde_json::to_string_pretty(&body).unwrap_or_else(|_| "{}".to_string())
}

// ============================================================================
// Helpers
// ============================================================================

fn format_mtime(modified_secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(modified_secs, 0)
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max - 1).collect::<String>() + "…"
    }
}

fn shorten_project(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    if parts.len() > 2 {
        format!("…/{}", parts[parts.len() - 2..].join("/"))
    } else {
        path.to_string()
    }
}
