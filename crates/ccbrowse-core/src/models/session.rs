//! Session metadata models

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Newtype for Session ID - zero-cost type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new SessionId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get reference to inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract inner String, consuming self
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SessionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SessionId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Deref for SessionId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Metadata for one recorded transcript
///
/// Wire format matches `GET /api/sessions`: `mtime` and `size` keep their
/// short names, everything else is camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Stable, unique identifier (file stem of the JSONL transcript)
    pub id: SessionId,

    /// Human title, may be empty
    #[serde(default)]
    pub summary: String,

    /// Last modification time in epoch seconds
    #[serde(rename = "mtime")]
    pub modified_time: i64,

    /// Transcript size on disk
    #[serde(rename = "size", default)]
    pub size_bytes: u64,

    /// Project label
    #[serde(default)]
    pub project: String,

    /// Path of the transcript file; its parent directory drives folder grouping
    #[serde(default)]
    pub file_path: String,

    #[serde(default)]
    pub is_favorite: bool,
}

impl Session {
    /// Summary, or a placeholder when the session has none
    pub fn title(&self) -> &str {
        if self.summary.trim().is_empty() {
            "(no summary)"
        } else {
            &self.summary
        }
    }

    /// Human-readable file size
    pub fn size_display(&self) -> String {
        let bytes = self.size_bytes;
        if bytes >= 1_000_000 {
            format!("{:.1} MB", bytes as f64 / 1_000_000.0)
        } else if bytes >= 1_000 {
            format!("{:.1} KB", bytes as f64 / 1_000.0)
        } else {
            format!("{} B", bytes)
        }
    }
}

/// Body of `GET /api/sessions`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionsResponse {
    #[serde(default)]
    pub sessions: Vec<Session>,
}

/// Body of `POST /api/sessions/{id}/favorite`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub is_favorite: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_wire_names() {
        let json = r#"{
            "id": "abc",
            "summary": "Fix the build",
            "mtime": 1700000000,
            "size": 2048,
            "project": "/Users/foo/app",
            "filePath": "/home/foo/.claude/projects/-Users-foo-app/abc.jsonl"
        }"#;

        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.id, "abc");
        assert_eq!(session.modified_time, 1_700_000_000);
        assert_eq!(session.size_bytes, 2048);
        assert!(!session.is_favorite, "isFavorite defaults to false");

        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["mtime"], 1_700_000_000);
        assert_eq!(value["size"], 2048);
        assert_eq!(value["isFavorite"], false);
        assert!(value.get("filePath").is_some());
    }

    #[test]
    fn test_session_title_placeholder() {
        let mut session: Session =
            serde_json::from_str(r#"{"id": "x", "mtime": 0, "summary": "  "}"#).unwrap();
        assert_eq!(session.title(), "(no summary)");

        session.summary = "Refactor parser".to_string();
        assert_eq!(session.title(), "Refactor parser");
    }

    #[test]
    fn test_session_size_display() {
        let mut session: Session = serde_json::from_str(r#"{"id": "x", "mtime": 0}"#).unwrap();

        session.size_bytes = 500;
        assert_eq!(session.size_display(), "500 B");

        session.size_bytes = 5_000;
        assert_eq!(session.size_display(), "5.0 KB");

        session.size_bytes = 2_500_000;
        assert_eq!(session.size_display(), "2.5 MB");
    }

    #[test]
    fn test_favorite_response_wire_name() {
        let resp: FavoriteResponse = serde_json::from_str(r#"{"isFavorite": true}"#).unwrap();
        assert!(resp.is_favorite);
    }
}
