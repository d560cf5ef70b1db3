//! Fixtures shared by unit tests

use crate::models::{Session, SessionId};
use chrono::{DateTime, TimeZone, Utc};

/// 2026-10-19 12:00:00 UTC
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
}

pub fn session(id: &str, file_path: &str, modified_time: i64) -> Session {
    Session {
        id: SessionId::from(id),
        summary: format!("Session {}", id),
        modified_time,
        size_bytes: 1024,
        project: "/Users/test/project".to_string(),
        file_path: file_path.to_string(),
        is_favorite: false,
    }
}

pub fn session_at(id: &str, modified_time: i64) -> Session {
    session(id, &format!("/projects/p/{}.jsonl", id), modified_time)
}
