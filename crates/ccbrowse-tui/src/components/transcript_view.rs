//! Right pane: the selected session's transcript

use crate::highlight::Highlighter;
use crate::theme;
use ccbrowse_core::models::{RenderableBlock, Transcript};
use ccbrowse_core::{displayable_messages, DisplayMessage, LoadStatus};
use chrono::{DateTime, Local};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Characters of a data URI kept before abbreviating
const DATA_URI_PREVIEW: usize = 32;

/// Scroll position of the transcript pane
#[derive(Debug, Default)]
pub struct TranscriptView {
    scroll: u16,
}

impl TranscriptView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn scroll_down(&mut self, n: u16) {
        self.scroll = self.scroll.saturating_add(n);
    }

    pub fn scroll_up(&mut self, n: u16) {
        self.scroll = self.scroll.saturating_sub(n);
    }

    pub fn reset(&mut self) {
        self.scroll = 0;
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        transcript: Option<&Transcript>,
        status: &LoadStatus,
        highlighter: &Highlighter,
    ) {
        let block = Block::default().borders(Borders::ALL);

        let (title, lines) = match (transcript, status) {
            (_, LoadStatus::Failed(message)) => (
                " Error ".to_string(),
                vec![Line::styled(message.clone(), Style::default().fg(theme::ERROR))],
            ),
            (None, LoadStatus::Loading) => (
                " Transcript ".to_string(),
                vec![Line::styled("Loading transcript...", theme::muted())],
            ),
            (None, _) => (
                " Transcript ".to_string(),
                vec![Line::styled("Select a session to view its transcript", theme::muted())],
            ),
            (Some(transcript), _) => {
                let messages = displayable_messages(&transcript.entries);
                let title = if transcript.summary.is_empty() {
                    format!(" {} ({} messages) ", transcript.session_id, messages.len())
                } else {
                    format!(" {} ({} messages) ", transcript.summary, messages.len())
                };
                (title, transcript_lines(&messages, highlighter))
            }
        };

        let max_scroll = lines.len().saturating_sub(1).min(u16::MAX as usize) as u16;
        let paragraph = Paragraph::new(lines)
            .block(block.title(title).border_style(Style::default().fg(theme::FOCUS)))
            .wrap(Wrap { trim: false })
            .scroll((self.scroll.min(max_scroll), 0));
        frame.render_widget(paragraph, area);
    }
}

/// Styled lines for a list of displayable messages
pub fn transcript_lines(messages: &[DisplayMessage], highlighter: &Highlighter) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for message in messages {
        let (label, color) = theme::role(message.role);
        let mut header = vec![Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )];
        if let Some(ts) = format_timestamp(&message.timestamp) {
            header.push(Span::raw(" "));
            header.push(Span::styled(ts, theme::muted()));
        }
        lines.push(Line::from(header));

        for block in &message.blocks {
            match block {
                RenderableBlock::Text { text } => lines.extend(highlighter.text_lines(text)),
                RenderableBlock::Image { url } => lines.push(Line::styled(
                    format!("[image: {}]", abbreviate_url(url)),
                    Style::default().fg(color).add_modifier(Modifier::ITALIC),
                )),
            }
        }
        lines.push(Line::default());
    }

    lines
}

/// Local time for RFC 3339 timestamps, raw text otherwise, nothing when empty
fn format_timestamp(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    Some(
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| raw.to_string()),
    )
}

/// Data URIs are cut short with their payload size; other URLs are kept
pub fn abbreviate_url(url: &str) -> String {
    if !url.starts_with("data:") || url.len() <= DATA_URI_PREVIEW {
        return url.to_string();
    }
    let preview: String = url.chars().take(DATA_URI_PREVIEW).collect();
    format!("{}… ({} bytes)", preview, url.len())
}
