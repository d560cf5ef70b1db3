//! Color language for the session browser
//!
//! - Cyan: selection and focus
//! - Yellow: favorites and pending confirmations
//! - Red: errors
//! - Gray: secondary metadata

use ccbrowse_core::models::Role;
use ratatui::style::{Color, Modifier, Style};

pub const FOCUS: Color = Color::Cyan;
pub const FAVORITE: Color = Color::Yellow;
pub const ERROR: Color = Color::Red;
pub const MUTED: Color = Color::DarkGray;

pub fn selected() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(FOCUS)
        .add_modifier(Modifier::BOLD)
}

pub fn group_header() -> Style {
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

/// Label and accent color for a message author
pub fn role(role: Role) -> (&'static str, Color) {
    match role {
        Role::User => ("User", Color::Blue),
        Role::Assistant => ("Assistant", Color::Green),
    }
}
