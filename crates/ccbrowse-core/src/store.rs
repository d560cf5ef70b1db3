//! Local session store reading `~/.claude/projects` directly
//!
//! Session files are discovered with walkdir and parsed line by line with a
//! buffered tokio reader. Favorites live in a DashSet for the lifetime of the
//! process.

use crate::error::{CoreError, CoreResult};
use crate::models::{Role, Session, SessionId, SessionLine, TranscriptResponse};
use crate::source::SessionSource;
use dashmap::DashSet;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Maximum characters for a first-user-message summary
const PREVIEW_MAX_CHARS: usize = 200;

/// Maximum lines to parse per file (circuit breaker)
const MAX_LINES: usize = 10_000;

/// Maximum line size in bytes (10MB)
const MAX_LINE_SIZE: usize = 10 * 1024 * 1024;

/// Session store over a Claude home directory
pub struct LocalSessionStore {
    claude_home: PathBuf,
    favorites: DashSet<String>,
}

impl LocalSessionStore {
    pub fn new(claude_home: impl Into<PathBuf>) -> Self {
        Self {
            claude_home: claude_home.into(),
            favorites: DashSet::new(),
        }
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.claude_home.join("projects")
    }

    /// All `*.jsonl` files under the projects directory, symlinks not followed
    pub fn discover_sessions(&self) -> Vec<PathBuf> {
        let mut sessions = Vec::new();

        for entry in WalkDir::new(self.projects_dir())
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|e| e == "jsonl") {
                sessions.push(path.to_path_buf());
            }
        }

        debug!(count = sessions.len(), "Discovered session files");
        sessions
    }

    /// Locate the file whose stem equals `id`
    fn find_session_file(&self, id: &SessionId) -> CoreResult<PathBuf> {
        self.discover_sessions()
            .into_iter()
            .find(|path| session_id_of(path).as_deref() == Some(id.as_str()))
            .ok_or_else(|| CoreError::SessionNotFound {
                session_id: id.to_string(),
            })
    }

    async fn session_info(&self, path: &Path, modified_time: i64, size_bytes: u64) -> Session {
        let id = session_id_of(path).unwrap_or_default();
        let summary = match read_summary(path).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read session summary");
                String::new()
            }
        };

        Session {
            is_favorite: self.favorites.contains(id.as_str()),
            id: SessionId::new(id),
            summary,
            modified_time,
            size_bytes,
            project: extract_project_path(path),
            file_path: path.display().to_string(),
        }
    }

    pub fn is_favorite(&self, id: &SessionId) -> bool {
        self.favorites.contains(id.as_str())
    }
}

impl SessionSource for LocalSessionStore {
    async fn list_sessions(&self, limit: usize) -> CoreResult<Vec<Session>> {
        let projects_dir = self.projects_dir();
        if !projects_dir.exists() {
            debug!(path = %projects_dir.display(), "Projects directory missing, no sessions");
            return Ok(Vec::new());
        }

        let mut files: Vec<(PathBuf, i64, u64)> = Vec::new();
        for path in self.discover_sessions() {
            match tokio::fs::metadata(&path).await {
                Ok(meta) => files.push((path, modified_secs(&meta), meta.len())),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable session"),
            }
        }

        files.sort_by(|a, b| b.1.cmp(&a.1));
        files.truncate(limit);

        let mut sessions = Vec::with_capacity(files.len());
        for (path, modified_time, size_bytes) in files {
            sessions.push(self.session_info(&path, modified_time, size_bytes).await);
        }

        info!(count = sessions.len(), limit, "Listed local sessions");
        Ok(sessions)
    }

    async fn transcript(&self, id: &SessionId) -> CoreResult<TranscriptResponse> {
        let path = self.find_session_file(id)?;
        let lines = parse_session(&path).await?;
        let summary = summary_from_lines(&lines);

        let loglines = lines
            .into_iter()
            .filter_map(SessionLine::into_entry)
            .collect::<Vec<_>>();
        debug!(session_id = %id, entries = loglines.len(), "Loaded transcript");

        Ok(TranscriptResponse { loglines, summary })
    }

    async fn session_html(&self, id: &SessionId) -> CoreResult<String> {
        let path = self.find_session_file(id)?;
        let lines = parse_session(&path).await?;
        Ok(render_html(&lines))
    }

    async fn delete_session(&self, id: &SessionId) -> CoreResult<()> {
        let path = self.find_session_file(id)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|source| CoreError::FileDelete {
                path: path.clone(),
                source,
            })?;
        self.favorites.remove(id.as_str());
        info!(session_id = %id, path = %path.display(), "Deleted session file");
        Ok(())
    }

    async fn toggle_favorite(&self, id: &SessionId) -> CoreResult<bool> {
        self.find_session_file(id)?;
        let is_favorite = if self.favorites.remove(id.as_str()).is_some() {
            false
        } else {
            self.favorites.insert(id.to_string());
            true
        };
        debug!(session_id = %id, is_favorite, "Toggled favorite");
        Ok(is_favorite)
    }
}

/// Session id for a path: the file stem
pub fn session_id_of(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

/// Decode the project directory name: `-Users-foo-bar` → `/Users/foo/bar`
pub fn extract_project_path(session_path: &Path) -> String {
    session_path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(|encoded| {
            if encoded.starts_with('-') {
                encoded.replace('-', "/")
            } else {
                encoded.to_string()
            }
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn modified_secs(meta: &std::fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn open_error(path: &Path, source: std::io::Error) -> CoreError {
    CoreError::FileRead {
        path: path.to_path_buf(),
        source,
    }
}

/// Stream every parseable line of a session file
///
/// Malformed and oversized lines are skipped with a warning; parsing stops
/// after [`MAX_LINES`].
pub async fn parse_session(path: &Path) -> CoreResult<Vec<SessionLine>> {
    let file = File::open(path).await.map_err(|e| open_error(path, e))?;
    let mut lines = BufReader::with_capacity(64 * 1024, file).lines();
    let mut parsed = Vec::new();
    let mut line_num = 0usize;

    while let Some(line) = lines.next_line().await.map_err(|e| open_error(path, e))? {
        line_num += 1;
        if line_num > MAX_LINES {
            warn!(path = %path.display(), max = MAX_LINES, "Session file too long, stopping parse");
            break;
        }
        if let Some(session_line) = parse_line(path, line_num, &line) {
            parsed.push(session_line);
        }
    }

    Ok(parsed)
}

fn parse_line(path: &Path, line_num: usize, line: &str) -> Option<SessionLine> {
    if line.len() > MAX_LINE_SIZE {
        warn!(path = %path.display(), line_num, size = line.len(), "Skipping oversized line");
        return None;
    }
    if line.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<SessionLine>(line) {
        Ok(session_line) => Some(session_line),
        Err(e) => {
            warn!(path = %path.display(), line_num, error = %e, "Failed to parse session line, skipping");
            None
        }
    }
}

/// Summary without loading the whole file: stops at the first summary line
async fn read_summary(path: &Path) -> CoreResult<String> {
    let file = File::open(path).await.map_err(|e| open_error(path, e))?;
    let mut lines = BufReader::new(file).lines();
    let mut first_prompt: Option<String> = None;
    let mut line_num = 0usize;

    while let Some(line) = lines.next_line().await.map_err(|e| open_error(path, e))? {
        line_num += 1;
        if line_num > MAX_LINES {
            break;
        }
        let Some(session_line) = parse_line(path, line_num, &line) else {
            continue;
        };

        if let Some(summary) = session_line.summary_text() {
            return Ok(summary.to_string());
        }
        if first_prompt.is_none() {
            first_prompt = user_prompt(&session_line);
        }
    }

    Ok(first_prompt.unwrap_or_default())
}

/// First summary line's text, else a preview of the first user prompt
pub fn summary_from_lines(lines: &[SessionLine]) -> String {
    lines
        .iter()
        .find_map(|line| line.summary_text().map(str::to_string))
        .or_else(|| lines.iter().find_map(user_prompt))
        .unwrap_or_default()
}

fn user_prompt(line: &SessionLine) -> Option<String> {
    if line.role() != Some(Role::User) || line.is_compact_summary {
        return None;
    }
    let text = line.message.as_ref()?.content.plain_text();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(PREVIEW_MAX_CHARS).collect())
}

/// Minimal standalone HTML page: one `<div class="entry TYPE">` per
/// conversational line with its text blocks joined by spaces
pub fn render_html(lines: &[SessionLine]) -> String {
    let mut html = String::from("<html><head><title>Session</title></head><body>");

    for line in lines.iter().filter(|l| l.role().is_some()) {
        let text = line
            .message
            .as_ref()
            .map(|m| m.content.plain_text())
            .unwrap_or_default();
        html.push_str(&format!(
            "<div class='entry {}'><pre>{}</pre></div>",
            escape_html(&line.line_type),
            escape_html(&text)
        ));
    }

    html.push_str("</body></html>");
    html
}

/// Escape text for HTML element and attribute content
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(json: &str) -> SessionLine {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extract_project_path() {
        let path = Path::new("/home/u/.claude/projects/-Users-test-myproject/abc.jsonl");
        assert_eq!(extract_project_path(path), "/Users/test/myproject");

        let path = Path::new("/home/u/.claude/projects/plain/abc.jsonl");
        assert_eq!(extract_project_path(path), "plain");
    }

    #[test]
    fn test_session_id_is_stem() {
        assert_eq!(
            session_id_of(Path::new("/p/-x/8f2c.jsonl")).as_deref(),
            Some("8f2c")
        );
    }

    #[test]
    fn test_summary_prefers_summary_line() {
        let lines = vec![
            line(r#"{"type":"user","message":{"content":"first question"}}"#),
            line(r#"{"type":"summary","summary":"  Fix the parser  "}"#),
        ];
        assert_eq!(summary_from_lines(&lines), "Fix the parser");
    }

    #[test]
    fn test_summary_falls_back_to_prompt() {
        let long = "x".repeat(500);
        let lines = vec![
            line(r#"{"type":"file-history-snapshot"}"#),
            line(r#"{"type":"user","message":{"content":[{"type":"tool_result","content":"ok"}]}}"#),
            line(&format!(r#"{{"type":"user","message":{{"content":"{}"}}}}"#, long)),
        ];
        let summary = summary_from_lines(&lines);
        assert_eq!(summary.chars().count(), PREVIEW_MAX_CHARS);

        assert_eq!(summary_from_lines(&[]), "");
    }

    #[test]
    fn test_render_html_escapes() {
        let lines = vec![
            line(r#"{"type":"user","message":{"content":"<script>alert(1)</script>"}}"#),
            line(r#"{"type":"assistant","message":{"content":[{"type":"text","text":"a"},{"type":"tool_use","id":"t","name":"x","input":{}},{"type":"text","text":"b"}]}}"#),
            line(r#"{"type":"summary","summary":"hidden"}"#),
        ];
        let html = render_html(&lines);
        assert!(html.starts_with("<html><head><title>Session</title></head><body>"));
        assert!(html.contains("<div class='entry user'><pre>&lt;script&gt;alert(1)&lt;/script&gt;</pre></div>"));
        assert!(html.contains("<div class='entry assistant'><pre>a b</pre></div>"));
        assert!(!html.contains("hidden"));
        assert!(html.ends_with("</body></html>"));
    }

    #[tokio::test]
    async fn test_parse_session_skips_malformed() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("s.jsonl");
        tokio::fs::write(&path, "not json\n\n{\"type\":\"user\"}\n")
            .await
            .unwrap();

        let lines = parse_session(&path).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_type, "user");
    }

    #[tokio::test]
    async fn test_parse_session_missing_file() {
        let err = parse_session(Path::new("/nonexistent/s.jsonl")).await.unwrap_err();
        assert!(matches!(err, CoreError::FileRead { .. }));
    }
}
