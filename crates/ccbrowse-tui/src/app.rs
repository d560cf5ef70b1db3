//! TUI application state and key handling

use crate::components::TranscriptView;
use crate::highlight::Highlighter;
use ccbrowse_core::models::SessionId;
use ccbrowse_core::{
    BrowsePreferences, DataEvent, GroupMode, Navigation, SessionDataController,
    SessionListController, SessionSource,
};
use chrono::Local;
use crossterm::event::KeyCode;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

/// Lines moved by one transcript scroll step
const SCROLL_STEP: u16 = 3;
/// Lines moved by PageDown/PageUp
const PAGE_STEP: u16 = 20;

/// TUI Application state
pub struct App<S> {
    pub controller: Arc<SessionDataController<S>>,
    pub list: SessionListController,
    pub transcript_view: TranscriptView,
    pub highlighter: Highlighter,

    /// Event receiver for data updates
    event_rx: broadcast::Receiver<DataEvent>,

    /// Results reported by spawned mutation tasks
    outcome_tx: mpsc::UnboundedSender<String>,
    outcome_rx: mpsc::UnboundedReceiver<String>,

    /// Session awaiting delete confirmation
    pub pending_delete: Option<SessionId>,

    pub status_message: Option<String>,
    pub should_quit: bool,

    /// Restored grouping still waits for a collection to collapse against
    reseed_on_load: bool,

    preferences: BrowsePreferences,
    cache_dir: Option<PathBuf>,
}

impl<S: SessionSource + 'static> App<S> {
    /// Create the app; `cache_dir` enables saving preferences on change
    pub fn new(
        controller: Arc<SessionDataController<S>>,
        preferences: BrowsePreferences,
        cache_dir: Option<PathBuf>,
    ) -> Self {
        let event_rx = controller.event_bus().subscribe();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let mut list = SessionListController::new();
        list.set_mode(preferences.group_mode, &[], &Local::now());
        let reseed_on_load = preferences.group_mode.is_grouped();

        Self {
            controller,
            list,
            transcript_view: TranscriptView::new(),
            highlighter: Highlighter::new(),
            event_rx,
            outcome_tx,
            outcome_rx,
            pending_delete: None,
            status_message: None,
            should_quit: false,
            reseed_on_load,
            preferences,
            cache_dir,
        }
    }

    pub fn preferences(&self) -> &BrowsePreferences {
        &self.preferences
    }

    /// Fetch the session list in the background
    pub fn reload(&mut self) {
        let ticket = self.controller.begin_sessions(self.preferences.limit);
        let controller = Arc::clone(&self.controller);
        self.status_message = Some("Loading sessions...".to_string());
        tokio::spawn(async move {
            controller.fetch_sessions(ticket).await;
        });
    }

    /// Handle a key press
    /// Returns true if the key was handled
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        if let Some(id) = self.pending_delete.take() {
            if matches!(key, KeyCode::Char('y') | KeyCode::Char('Y')) {
                self.delete(id);
            } else {
                self.status_message = Some("Delete cancelled".to_string());
            }
            return true;
        }

        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => self.navigate(Navigation::Next),
            KeyCode::Char('k') | KeyCode::Up => self.navigate(Navigation::Previous),
            KeyCode::Char('g') => self.cycle_mode(),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected_group(),
            KeyCode::Char('a') => self.toggle_all_groups(),
            KeyCode::Char('f') => self.toggle_favorite(),
            KeyCode::Char('d') => self.confirm_delete(),
            KeyCode::Char('r') | KeyCode::F(5) => self.reload(),
            KeyCode::Char('J') => self.transcript_view.scroll_down(SCROLL_STEP),
            KeyCode::Char('K') => self.transcript_view.scroll_up(SCROLL_STEP),
            KeyCode::PageDown => self.transcript_view.scroll_down(PAGE_STEP),
            KeyCode::PageUp => self.transcript_view.scroll_up(PAGE_STEP),
            _ => return false,
        }
        true
    }

    fn navigate(&mut self, direction: Navigation) {
        let changed = self
            .controller
            .with_sessions(|sessions| self.list.navigate(direction, sessions).cloned());
        if let Some(id) = changed {
            self.request_transcript(Some(id));
        }
    }

    /// Select a session (or none) and load its transcript
    pub fn select(&mut self, id: Option<SessionId>) {
        if self.list.select(id.clone()) {
            self.request_transcript(id);
        }
    }

    /// Start a transcript load; the generation bump happens before spawning
    fn request_transcript(&mut self, id: Option<SessionId>) {
        self.transcript_view.reset();
        if let Some(ticket) = self.controller.begin_transcript(id) {
            let controller = Arc::clone(&self.controller);
            tokio::spawn(async move {
                controller.fetch_transcript(ticket).await;
            });
        }
    }

    fn cycle_mode(&mut self) {
        let mode = self.list.mode().next();
        self.set_mode(mode);
    }

    pub fn set_mode(&mut self, mode: GroupMode) {
        self.reseed_on_load = false;
        let now = Local::now();
        let changed = self
            .controller
            .with_sessions(|sessions| self.list.set_mode(mode, sessions, &now));
        if !changed {
            return;
        }

        self.status_message = Some(format!("Grouping: {}", mode));
        self.preferences.group_mode = mode;
        self.save_preferences();
    }

    fn save_preferences(&self) {
        let Some(cache_dir) = &self.cache_dir else {
            return;
        };
        if let Err(e) = self.preferences.save(cache_dir) {
            warn!(error = %e, "Failed to save preferences");
        }
    }

    fn toggle_selected_group(&mut self) {
        let now = Local::now();
        let key = self
            .controller
            .with_sessions(|sessions| self.list.selected_group(sessions, &now));
        if let Some(key) = key {
            self.list.toggle_group(&key);
        }
    }

    fn toggle_all_groups(&mut self) {
        let now = Local::now();
        self.controller
            .with_sessions(|sessions| self.list.toggle_all(sessions, &now));
    }

    fn toggle_favorite(&mut self) {
        let Some(id) = self.list.selected().cloned() else {
            return;
        };
        let controller = Arc::clone(&self.controller);
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let message = match controller.toggle_favorite(&id).await {
                Some(true) => format!("★ Added {} to favorites", id),
                Some(false) => format!("Removed {} from favorites", id),
                None => format!("Failed to update favorite for {}", id),
            };
            let _ = outcome_tx.send(message);
        });
    }

    fn confirm_delete(&mut self) {
        if let Some(id) = self.list.selected().cloned() {
            self.status_message = Some(format!("Delete session {}? (y/n)", id));
            self.pending_delete = Some(id);
        }
    }

    fn delete(&mut self, id: SessionId) {
        let controller = Arc::clone(&self.controller);
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let message = if controller.delete_session(&id).await {
                format!("Deleted {}", id)
            } else {
                format!("Failed to delete {}", id)
            };
            let _ = outcome_tx.send(message);
        });
    }

    /// Drain data events and task outcomes (non-blocking)
    pub fn poll_events(&mut self) {
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "Event receiver lagged");
                    self.sync_selection();
                }
                Err(_) => break,
            }
        }

        while let Ok(message) = self.outcome_rx.try_recv() {
            self.status_message = Some(message);
        }
    }

    fn apply_event(&mut self, event: DataEvent) {
        match event {
            DataEvent::SessionsLoaded { count } => {
                self.status_message = Some(format!("Loaded {} sessions", count));
                if std::mem::take(&mut self.reseed_on_load) {
                    let now = Local::now();
                    self.controller
                        .with_sessions(|sessions| self.list.reseed(sessions, &now));
                }
                self.sync_selection();
            }
            DataEvent::SessionsFailed(message) => {
                self.status_message = Some(format!("Failed to load sessions: {}", message));
            }
            DataEvent::SessionDeleted(_) => self.sync_selection(),
            DataEvent::TranscriptLoaded(_)
            | DataEvent::TranscriptFailed(_)
            | DataEvent::FavoriteChanged { .. } => {}
        }
    }

    /// Drop a vanished selection and fall back to the first session
    fn sync_selection(&mut self) {
        let (cleared, first) = self.controller.with_sessions(|sessions| {
            (
                self.list.retain_selection(sessions),
                sessions.first().map(|s| s.id.clone()),
            )
        });

        if self.list.selected().is_none() {
            match first {
                Some(id) => self.select(Some(id)),
                None if cleared => self.request_transcript(None),
                None => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccbrowse_core::LocalSessionStore;
    use std::fs;
    use std::time::Duration;

    fn write_session(home: &std::path::Path, project: &str, id: &str, text: &str) {
        let dir = home.join("projects").join(project);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(format!("{}.jsonl", id)),
            format!(r#"{{"type":"user","message":{{"content":"{}"}}}}"#, text),
        )
        .unwrap();
    }

    async fn loaded_app(home: &std::path::Path) -> App<LocalSessionStore> {
        let store = Arc::new(LocalSessionStore::new(home));
        let controller = Arc::new(SessionDataController::new(store));
        let mut app = App::new(controller, BrowsePreferences::default(), None);
        assert!(app.controller.load_sessions(50).await);
        app.poll_events();
        app
    }

    async fn wait_for<F: Fn() -> bool>(cond: F) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_first_session_selected_after_load() {
        let temp = tempfile::tempdir().unwrap();
        write_session(temp.path(), "-p-one", "s1", "hello");
        let app = loaded_app(temp.path()).await;

        assert_eq!(app.list.selected().map(|id| id.as_str()), Some("s1"));
        wait_for(|| app.controller.transcript().is_some()).await;
        assert_eq!(app.controller.transcript().unwrap().session_id, "s1");
    }

    #[tokio::test]
    async fn test_navigation_loads_transcript() {
        let temp = tempfile::tempdir().unwrap();
        write_session(temp.path(), "-p-one", "s1", "one");
        write_session(temp.path(), "-p-two", "s2", "two");
        let mut app = loaded_app(temp.path()).await;

        let first = app.list.selected().cloned().unwrap();
        assert!(app.handle_key(KeyCode::Char('j')));
        let second = app.list.selected().cloned().unwrap();
        assert_ne!(first, second);
        assert_eq!(app.controller.requested_transcript(), Some(second.clone()));

        wait_for(|| {
            app.controller
                .transcript()
                .is_some_and(|t| t.session_id == second)
        })
        .await;

        // clamped at the end
        app.handle_key(KeyCode::Down);
        assert_eq!(app.list.selected(), Some(&second));
    }

    #[tokio::test]
    async fn test_cycle_mode_collapses_groups() {
        let temp = tempfile::tempdir().unwrap();
        write_session(temp.path(), "-p-one", "s1", "one");
        write_session(temp.path(), "-p-two", "s2", "two");
        let mut app = loaded_app(temp.path()).await;

        app.handle_key(KeyCode::Char('g'));
        assert_eq!(app.list.mode(), GroupMode::Folder);
        assert_eq!(app.preferences().group_mode, GroupMode::Folder);
        assert_eq!(app.list.collapse_state().len(), 2);

        app.handle_key(KeyCode::Enter);
        assert_eq!(app.list.collapse_state().len(), 1);

        app.handle_key(KeyCode::Char('a'));
        assert!(app.list.collapse_state().is_empty());
    }

    #[tokio::test]
    async fn test_restored_grouping_starts_collapsed() {
        let temp = tempfile::tempdir().unwrap();
        write_session(temp.path(), "-p-one", "s1", "one");
        write_session(temp.path(), "-p-two", "s2", "two");

        let store = Arc::new(LocalSessionStore::new(temp.path()));
        let controller = Arc::new(SessionDataController::new(store));
        let preferences = BrowsePreferences {
            group_mode: GroupMode::Folder,
            ..Default::default()
        };
        let mut app = App::new(controller, preferences, None);
        assert!(app.list.collapse_state().is_empty());

        assert!(app.controller.load_sessions(50).await);
        app.poll_events();
        assert_eq!(app.list.mode(), GroupMode::Folder);
        assert_eq!(app.list.collapse_state().len(), 2);

        // later reloads leave the user's folding alone
        app.handle_key(KeyCode::Char('a'));
        assert!(app.list.collapse_state().is_empty());
        assert!(app.controller.load_sessions(50).await);
        app.poll_events();
        assert!(app.list.collapse_state().is_empty());
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let temp = tempfile::tempdir().unwrap();
        write_session(temp.path(), "-p-one", "s1", "one");
        let mut app = loaded_app(temp.path()).await;

        app.handle_key(KeyCode::Char('d'));
        assert!(app.pending_delete.is_some());
        app.handle_key(KeyCode::Char('n'));
        assert!(app.pending_delete.is_none());
        assert_eq!(app.status_message.as_deref(), Some("Delete cancelled"));
        assert_eq!(app.controller.sessions().len(), 1);

        app.handle_key(KeyCode::Char('d'));
        app.handle_key(KeyCode::Char('y'));
        wait_for(|| app.controller.sessions().is_empty()).await;

        app.poll_events();
        assert!(app.list.selected().is_none());
        assert!(app.controller.transcript().is_none());
        assert_eq!(app.status_message.as_deref(), Some("Deleted s1"));
    }

    #[tokio::test]
    async fn test_quit_and_unknown_keys() {
        let temp = tempfile::tempdir().unwrap();
        let mut app = loaded_app(temp.path()).await;
        assert!(!app.handle_key(KeyCode::Char('x')));
        assert!(app.handle_key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
