//! User preferences persistence for ccbrowse
//!
//! Stores browser preferences in `~/.claude/cache/ccbrowse-preferences.json`.

use crate::grouping::GroupMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const PREFERENCES_FILE: &str = "ccbrowse-preferences.json";

/// Default number of sessions fetched per load
pub const DEFAULT_SESSION_LIMIT: usize = 50;

/// Browser preferences restored at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowsePreferences {
    /// Grouping mode last used in the terminal browser
    pub group_mode: GroupMode,

    /// Maximum sessions to load
    pub limit: usize,
}

impl Default for BrowsePreferences {
    fn default() -> Self {
        Self {
            group_mode: GroupMode::None,
            limit: DEFAULT_SESSION_LIMIT,
        }
    }
}

impl BrowsePreferences {
    /// Load preferences from `<cache_dir>/ccbrowse-preferences.json`.
    /// Returns defaults on any I/O or parse error.
    pub fn load(cache_dir: &Path) -> Self {
        let path = cache_dir.join(PREFERENCES_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Persist preferences to `<cache_dir>/ccbrowse-preferences.json`.
    pub fn save(&self, cache_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(cache_dir)
            .context("Failed to create cache directory for preferences")?;
        let path = cache_dir.join(PREFERENCES_FILE);
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize preferences")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write preferences to {}", path.display()))
    }
}
