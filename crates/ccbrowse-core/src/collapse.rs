//! Collapsed-group bookkeeping for the grouped session list
//!
//! Kept apart from [`Session`](crate::models::Session) so ephemeral view
//! state never touches session identity. A group's sessions are visible iff
//! its key is not in the set.

use crate::grouping::GroupMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of currently collapsed group keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollapseState {
    collapsed: BTreeSet<String>,
}

impl CollapseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a newly selected grouping mode
    ///
    /// Ungrouped views have nothing to collapse; grouped views start with
    /// every group collapsed.
    pub fn reseed_for<I, K>(&mut self, mode: GroupMode, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.collapsed.clear();
        if mode.is_grouped() {
            self.collapsed.extend(keys.into_iter().map(Into::into));
        }
    }

    /// Flip one key; other keys are untouched
    pub fn toggle(&mut self, key: &str) {
        if !self.collapsed.remove(key) {
            self.collapsed.insert(key.to_string());
        }
    }

    /// Expand everything if anything is collapsed, otherwise collapse all `keys`
    ///
    /// Decided by cardinality alone: a partially collapsed list expands fully.
    pub fn toggle_all<I, K>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        if self.collapsed.is_empty() {
            self.collapsed.extend(keys.into_iter().map(Into::into));
        } else {
            self.collapsed.clear();
        }
    }

    pub fn is_collapsed(&self, key: &str) -> bool {
        self.collapsed.contains(key)
    }

    /// Whether a group's sessions should be rendered
    pub fn is_visible(&self, key: &str) -> bool {
        !self.is_collapsed(key)
    }

    pub fn len(&self) -> usize {
        self.collapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }

    /// Collapsed keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.collapsed.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reseed_none_clears() {
        let mut state = CollapseState::new();
        state.toggle("A");
        state.reseed_for(GroupMode::None, ["A", "B"]);
        assert!(state.is_empty());
    }

    #[test]
    fn test_reseed_grouped_collapses_all() {
        let mut state = CollapseState::new();
        state.toggle("stale");
        state.reseed_for(GroupMode::Folder, ["A", "B"]);
        assert_eq!(state.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert!(!state.is_collapsed("stale"));

        state.reseed_for(GroupMode::Date, ["Today"]);
        assert_eq!(state.keys().collect::<Vec<_>>(), vec!["Today"]);
    }

    #[test]
    fn test_toggle_single_key() {
        let mut state = CollapseState::new();
        state.reseed_for(GroupMode::Folder, ["A", "B"]);

        state.toggle("A");
        assert!(state.is_visible("A"));
        assert!(state.is_collapsed("B"));

        state.toggle("A");
        assert!(state.is_collapsed("A"));
        assert!(state.is_collapsed("B"));
    }

    #[test]
    fn test_toggle_all_cycle() {
        let mut state = CollapseState::new();
        state.reseed_for(GroupMode::Folder, ["A", "B"]);

        state.toggle_all(["A", "B"]);
        assert!(state.is_empty());

        state.toggle_all(["A", "B"]);
        assert!(state.is_collapsed("A"));
        assert!(state.is_collapsed("B"));
    }

    #[test]
    fn test_toggle_all_partial_expands() {
        let mut state = CollapseState::new();
        state.toggle("A");
        state.toggle_all(["A", "B", "C"]);
        assert!(state.is_empty());
    }

    #[test]
    fn test_serializes_as_list() {
        let mut state = CollapseState::new();
        state.reseed_for(GroupMode::Date, ["Today", "Yesterday"]);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"["Today","Yesterday"]"#);
        let back: CollapseState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
