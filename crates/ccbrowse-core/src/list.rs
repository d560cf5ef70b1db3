//! Session list controller: grouping mode, collapse state and selection
//!
//! The controller does not own the session collection; every query takes the
//! current slice so group assignments are always derived fresh. Keyboard
//! navigation walks the flat collection order whatever the display mode.

use crate::collapse::CollapseState;
use crate::grouping::{group_keys, group_sessions, GroupMode};
use crate::models::{Session, SessionId};
use chrono::{DateTime, TimeZone};
use std::fmt;
use tracing::debug;

/// Linear movement through the flat session order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Previous,
}

impl Navigation {
    /// Map a key name (`ArrowDown`, `j`, `ArrowUp`, `k`) to a movement
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowDown" | "j" => Some(Navigation::Next),
            "ArrowUp" | "k" => Some(Navigation::Previous),
            _ => None,
        }
    }
}

/// A group as it should be displayed
#[derive(Debug, Clone, PartialEq)]
pub struct GroupView<'a> {
    pub key: String,
    /// Number of sessions in the group, collapsed or not
    pub total: usize,
    pub collapsed: bool,
    /// Sessions to render; empty while collapsed
    pub sessions: Vec<&'a Session>,
}

/// One display row of the session list
#[derive(Debug, Clone, PartialEq)]
pub enum ListRow<'a> {
    Header {
        key: String,
        total: usize,
        collapsed: bool,
    },
    Session(&'a Session),
}

/// List state shared by the terminal browser and the CLI
#[derive(Debug, Clone, Default)]
pub struct SessionListController {
    mode: GroupMode,
    collapse: CollapseState,
    selected: Option<SessionId>,
}

impl SessionListController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> GroupMode {
        self.mode
    }

    pub fn collapse_state(&self) -> &CollapseState {
        &self.collapse
    }

    pub fn selected(&self) -> Option<&SessionId> {
        self.selected.as_ref()
    }

    /// Switch grouping mode
    ///
    /// Collapse state is reseeded before the mode is stored, so the new mode
    /// is never observable alongside the previous mode's collapse set.
    /// Returns false when `mode` is already active.
    pub fn set_mode<Tz>(&mut self, mode: GroupMode, sessions: &[Session], now: &DateTime<Tz>) -> bool
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        if mode == self.mode {
            return false;
        }

        let keys = group_keys(sessions, mode, now);
        debug!(mode = %mode, groups = keys.len(), "Switching grouping mode");
        self.collapse.reseed_for(mode, keys);
        self.mode = mode;
        true
    }

    /// Collapse every group of the current mode, as a fresh mode switch would
    pub fn reseed<Tz>(&mut self, sessions: &[Session], now: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let keys = group_keys(sessions, self.mode, now);
        self.collapse.reseed_for(self.mode, keys);
    }

    /// Groups in display order with their visibility applied
    pub fn groups<'a, Tz>(&self, sessions: &'a [Session], now: &DateTime<Tz>) -> Vec<GroupView<'a>>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        group_sessions(sessions, self.mode, now)
            .into_iter()
            .map(|group| {
                let collapsed = self.collapse.is_collapsed(&group.key);
                GroupView {
                    total: group.sessions.len(),
                    sessions: if collapsed { Vec::new() } else { group.sessions },
                    key: group.key,
                    collapsed,
                }
            })
            .collect()
    }

    /// Flattened display rows: headers and visible sessions, or the plain
    /// collection when ungrouped
    pub fn rows<'a, Tz>(&self, sessions: &'a [Session], now: &DateTime<Tz>) -> Vec<ListRow<'a>>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        if !self.mode.is_grouped() {
            return sessions.iter().map(ListRow::Session).collect();
        }

        let mut rows = Vec::new();
        for group in self.groups(sessions, now) {
            rows.push(ListRow::Header {
                key: group.key,
                total: group.total,
                collapsed: group.collapsed,
            });
            rows.extend(group.sessions.into_iter().map(ListRow::Session));
        }
        rows
    }

    pub fn toggle_group(&mut self, key: &str) {
        self.collapse.toggle(key);
    }

    /// Expand all when anything is collapsed, else collapse every current group
    pub fn toggle_all<Tz>(&mut self, sessions: &[Session], now: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let keys = group_keys(sessions, self.mode, now);
        self.collapse.toggle_all(keys);
    }

    /// Group key of the selected session under the current mode
    pub fn selected_group<Tz>(&self, sessions: &[Session], now: &DateTime<Tz>) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let selected = self.selected.as_ref()?;
        group_sessions(sessions, self.mode, now)
            .into_iter()
            .find(|group| group.sessions.iter().any(|s| &s.id == selected))
            .map(|group| group.key)
    }

    /// Set the selection; returns true when it changed
    pub fn select(&mut self, id: Option<SessionId>) -> bool {
        if self.selected == id {
            return false;
        }
        self.selected = id;
        true
    }

    /// Index of the selection in the flat collection
    pub fn selected_index(&self, sessions: &[Session]) -> Option<usize> {
        let selected = self.selected.as_ref()?;
        sessions.iter().position(|s| &s.id == selected)
    }

    /// Move the selection one step through the flat collection
    ///
    /// Clamped at both ends, no wraparound, and a no-op without a current
    /// selection. Collapsed groups are not skipped. Returns the new
    /// selection when it changed.
    pub fn navigate(&mut self, direction: Navigation, sessions: &[Session]) -> Option<&SessionId> {
        let current = self.selected_index(sessions)?;
        let last = sessions.len() - 1;
        let next = match direction {
            Navigation::Next => (current + 1).min(last),
            Navigation::Previous => current.saturating_sub(1),
        };

        if next == current {
            return None;
        }
        self.selected = Some(sessions[next].id.clone());
        self.selected.as_ref()
    }

    /// Drop a selection that no longer exists in `sessions`; returns true if cleared
    pub fn retain_selection(&mut self, sessions: &[Session]) -> bool {
        match &self.selected {
            Some(id) if !sessions.iter().any(|s| &s.id == id) => {
                self.selected = None;
                true
            }
            _ => false,
        }
    }
}
