//! Session data controller
//!
//! Owns the session collection and the transcript of the selected session,
//! both behind `parking_lot::RwLock`. Locks are taken only around state
//! reads and writes, never across a fetch.
//!
//! Transcript fetches carry a generation number captured when the fetch
//! starts. A result is committed only if no newer request (including a
//! switch to "no selection") has started since, and the requested id still
//! matches. Session list loads work the same way; a confirmed delete or
//! favorite change also outdates any list fetched before it.

use crate::error::CoreResult;
use crate::event::{DataEvent, EventBus};
use crate::models::{Session, SessionId, Transcript, TranscriptResponse};
use crate::source::SessionSource;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Progress of an asynchronous load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    /// User-visible error message
    Failed(String),
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadStatus::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

#[derive(Default)]
struct CollectionState {
    sessions: Vec<Session>,
    status: LoadStatus,
    /// Bumped by every list load and every confirmed mutation
    generation: u64,
    /// Generation of the most recently started list load
    latest_load: u64,
}

#[derive(Default)]
struct TranscriptState {
    generation: u64,
    requested: Option<SessionId>,
    transcript: Option<Transcript>,
    status: LoadStatus,
}

/// Handle for one in-flight session list fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionsTicket {
    generation: u64,
    limit: usize,
}

impl SessionsTicket {
    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Handle for one in-flight transcript fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptTicket {
    generation: u64,
    id: SessionId,
}

impl TranscriptTicket {
    pub fn id(&self) -> &SessionId {
        &self.id
    }
}

/// Async orchestration of session and transcript retrieval
pub struct SessionDataController<S> {
    source: Arc<S>,
    collection: RwLock<CollectionState>,
    transcript: RwLock<TranscriptState>,
    event_bus: EventBus,
}

impl<S: SessionSource> SessionDataController<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            collection: RwLock::new(CollectionState::default()),
            transcript: RwLock::new(TranscriptState::default()),
            event_bus: EventBus::default_capacity(),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    // ===================
    // Read accessors
    // ===================

    /// Snapshot of the session collection
    pub fn sessions(&self) -> Vec<Session> {
        self.collection.read().sessions.clone()
    }

    /// Borrow the collection for the duration of `f` without cloning
    pub fn with_sessions<R>(&self, f: impl FnOnce(&[Session]) -> R) -> R {
        f(&self.collection.read().sessions)
    }

    pub fn session(&self, id: &SessionId) -> Option<Session> {
        self.collection
            .read()
            .sessions
            .iter()
            .find(|s| &s.id == id)
            .cloned()
    }

    pub fn sessions_status(&self) -> LoadStatus {
        self.collection.read().status.clone()
    }

    /// Transcript of the current selection, once loaded
    pub fn transcript(&self) -> Option<Transcript> {
        self.transcript.read().transcript.clone()
    }

    pub fn transcript_status(&self) -> LoadStatus {
        self.transcript.read().status.clone()
    }

    /// Id whose transcript was most recently requested
    pub fn requested_transcript(&self) -> Option<SessionId> {
        self.transcript.read().requested.clone()
    }

    // ===================
    // Retrieval
    // ===================

    /// Synchronous half of a session list load
    ///
    /// Marks the collection as loading and returns a ticket for
    /// [`fetch_sessions`](Self::fetch_sessions). Starting another load, or a
    /// confirmed delete or favorite change, makes this ticket stale.
    pub fn begin_sessions(&self, limit: usize) -> SessionsTicket {
        let mut state = self.collection.write();
        state.generation += 1;
        state.latest_load = state.generation;
        state.status = LoadStatus::Loading;
        debug!(limit, generation = state.generation, "Session list requested");

        SessionsTicket {
            generation: state.generation,
            limit,
        }
    }

    /// Fetch the session list for a ticket and commit it if still current
    ///
    /// Returns true when the fetched collection replaced the local one.
    pub async fn fetch_sessions(&self, ticket: SessionsTicket) -> bool {
        let result = self.source.list_sessions(ticket.limit).await;
        self.finish_sessions(ticket, result)
    }

    /// Replace the collection with up to `limit` sessions
    ///
    /// On failure the previous collection is kept and the error is exposed
    /// through [`sessions_status`](Self::sessions_status). The status reads
    /// `Loading` from the moment this is called. Returns true on success.
    pub fn load_sessions(&self, limit: usize) -> impl Future<Output = bool> + Send + '_ {
        let ticket = self.begin_sessions(limit);
        async move { self.fetch_sessions(ticket).await }
    }

    fn finish_sessions(&self, ticket: SessionsTicket, result: CoreResult<Vec<Session>>) -> bool {
        let event = {
            let mut state = self.collection.write();
            if state.latest_load != ticket.generation {
                debug!(generation = ticket.generation, "Discarding superseded session list");
                return false;
            }

            if state.generation != ticket.generation {
                // only local mutations happened since; the snapshot predates them
                debug!(generation = ticket.generation, "Discarding session list older than a mutation");
                state.status = match &result {
                    Ok(_) => LoadStatus::Loaded,
                    Err(e) => LoadStatus::Failed(e.user_message()),
                };
                return false;
            }

            match result {
                Ok(sessions) => {
                    let count = sessions.len();
                    state.sessions = sessions;
                    state.status = LoadStatus::Loaded;
                    info!(count, "Sessions loaded");
                    DataEvent::SessionsLoaded { count }
                }
                Err(e) => {
                    let message = e.user_message();
                    warn!(error = %e, "Failed to load sessions");
                    state.status = LoadStatus::Failed(message.clone());
                    DataEvent::SessionsFailed(message)
                }
            }
        };

        let applied = matches!(event, DataEvent::SessionsLoaded { .. });
        self.event_bus.publish(event);
        applied
    }

    /// Synchronous half of a transcript request
    ///
    /// Bumps the generation, records the requested id and returns a ticket
    /// to fetch with. `None` clears the transcript and its error and returns
    /// no ticket; any fetch still in flight becomes stale.
    pub fn begin_transcript(&self, id: Option<SessionId>) -> Option<TranscriptTicket> {
        let mut state = self.transcript.write();
        state.generation += 1;
        state.requested = id.clone();

        let Some(id) = id else {
            state.transcript = None;
            state.status = LoadStatus::Idle;
            return None;
        };

        if state
            .transcript
            .as_ref()
            .is_some_and(|t| t.session_id != id)
        {
            state.transcript = None;
        }
        state.status = LoadStatus::Loading;
        debug!(session_id = %id, generation = state.generation, "Transcript requested");

        Some(TranscriptTicket {
            generation: state.generation,
            id,
        })
    }

    /// Fetch the transcript for a ticket and commit it if still current
    ///
    /// Returns true when the result (success or failure) was applied.
    pub async fn fetch_transcript(&self, ticket: TranscriptTicket) -> bool {
        let result = self.source.transcript(&ticket.id).await;
        self.finish_transcript(ticket, result)
    }

    /// Request the transcript for `id`, or clear it with `None`
    ///
    /// The generation bump happens when this is called, not when the
    /// returned future is first polled.
    pub fn load_transcript(
        &self,
        id: Option<SessionId>,
    ) -> impl Future<Output = bool> + Send + '_ {
        let ticket = self.begin_transcript(id);
        async move {
            match ticket {
                Some(ticket) => self.fetch_transcript(ticket).await,
                None => false,
            }
        }
    }

    fn finish_transcript(
        &self,
        ticket: TranscriptTicket,
        result: CoreResult<TranscriptResponse>,
    ) -> bool {
        let event = {
            let mut state = self.transcript.write();
            if state.generation != ticket.generation
                || state.requested.as_ref() != Some(&ticket.id)
            {
                debug!(
                    session_id = %ticket.id,
                    generation = ticket.generation,
                    current = state.generation,
                    "Discarding stale transcript"
                );
                return false;
            }

            match result {
                Ok(response) => {
                    state.transcript = Some(Transcript::from_response(ticket.id.clone(), response));
                    state.status = LoadStatus::Loaded;
                    DataEvent::TranscriptLoaded(ticket.id)
                }
                Err(e) => {
                    warn!(session_id = %ticket.id, error = %e, "Failed to load transcript");
                    state.transcript = None;
                    state.status = LoadStatus::Failed(e.user_message());
                    DataEvent::TranscriptFailed(ticket.id)
                }
            }
        };

        self.event_bus.publish(event);
        true
    }

    /// Pre-rendered HTML view, passed through from the source
    pub async fn session_html(&self, id: &SessionId) -> CoreResult<String> {
        self.source.session_html(id).await
    }

    // ===================
    // Mutations
    // ===================

    /// Delete a session; on success the exact id leaves the collection
    pub async fn delete_session(&self, id: &SessionId) -> bool {
        match self.source.delete_session(id).await {
            Ok(()) => {
                {
                    let mut state = self.collection.write();
                    state.generation += 1;
                    state.sessions.retain(|s| &s.id != id);
                }
                info!(session_id = %id, "Session deleted");
                self.event_bus.publish(DataEvent::SessionDeleted(id.clone()));
                true
            }
            Err(e) => {
                warn!(session_id = %id, error = %e, "Failed to delete session");
                false
            }
        }
    }

    /// Toggle a favorite; the local copy takes the source-confirmed value
    pub async fn toggle_favorite(&self, id: &SessionId) -> Option<bool> {
        match self.source.toggle_favorite(id).await {
            Ok(is_favorite) => {
                {
                    let mut state = self.collection.write();
                    state.generation += 1;
                    if let Some(session) = state.sessions.iter_mut().find(|s| &s.id == id) {
                        session.is_favorite = is_favorite;
                    }
                }
                debug!(session_id = %id, is_favorite, "Favorite updated");
                self.event_bus.publish(DataEvent::FavoriteChanged {
                    id: id.clone(),
                    is_favorite,
                });
                Some(is_favorite)
            }
            Err(e) => {
                warn!(session_id = %id, error = %e, "Failed to toggle favorite");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::models::{MessageContent, Role, TranscriptEntry};
    use crate::test_support::session;
    use parking_lot::Mutex;

    /// In-memory source with scriptable failures
    #[derive(Default)]
    struct FakeSource {
        sessions: Mutex<Vec<Session>>,
        fail: Mutex<bool>,
        favorite_reply: Mutex<bool>,
    }

    impl FakeSource {
        fn with_sessions(sessions: Vec<Session>) -> Self {
            Self {
                sessions: Mutex::new(sessions),
                ..Default::default()
            }
        }

        fn set_failing(&self, fail: bool) {
            *self.fail.lock() = fail;
        }

        fn check(&self) -> CoreResult<()> {
            if *self.fail.lock() {
                return Err(CoreError::HttpStatus {
                    url: "http://test/api".to_string(),
                    status: 500,
                });
            }
            Ok(())
        }
    }

    impl SessionSource for FakeSource {
        async fn list_sessions(&self, limit: usize) -> CoreResult<Vec<Session>> {
            self.check()?;
            Ok(self.sessions.lock().iter().take(limit).cloned().collect())
        }

        async fn transcript(&self, id: &SessionId) -> CoreResult<TranscriptResponse> {
            self.check()?;
            Ok(TranscriptResponse {
                loglines: vec![TranscriptEntry::new(
                    Role::User,
                    MessageContent::Text(format!("hello from {}", id)),
                )],
                summary: format!("summary {}", id),
            })
        }

        async fn session_html(&self, id: &SessionId) -> CoreResult<String> {
            self.check()?;
            Ok(format!("<html>{}</html>", id))
        }

        async fn delete_session(&self, id: &SessionId) -> CoreResult<()> {
            self.check()?;
            self.sessions.lock().retain(|s| &s.id != id);
            Ok(())
        }

        async fn toggle_favorite(&self, _id: &SessionId) -> CoreResult<bool> {
            self.check()?;
            Ok(*self.favorite_reply.lock())
        }
    }

    fn controller(ids: &[&str]) -> SessionDataController<FakeSource> {
        let sessions = ids
            .iter()
            .map(|id| session(id, &format!("/p/x/{}.jsonl", id), 0))
            .collect();
        SessionDataController::new(Arc::new(FakeSource::with_sessions(sessions)))
    }

    #[tokio::test]
    async fn test_load_sessions_success_and_failure() {
        let ctrl = controller(&["a", "b", "c"]);
        assert_eq!(ctrl.sessions_status(), LoadStatus::Idle);

        assert!(ctrl.load_sessions(2).await);
        assert_eq!(ctrl.sessions().len(), 2);
        assert_eq!(ctrl.sessions_status(), LoadStatus::Loaded);

        ctrl.source().set_failing(true);
        assert!(!ctrl.load_sessions(10).await);
        assert_eq!(ctrl.sessions().len(), 2, "previous collection kept");
        assert_eq!(
            ctrl.sessions_status().error(),
            Some("Server returned HTTP 500")
        );
    }

    #[tokio::test]
    async fn test_load_transcript_and_clear() {
        let ctrl = controller(&["a"]);
        assert!(ctrl.load_transcript(Some(SessionId::from("a"))).await);

        let transcript = ctrl.transcript().unwrap();
        assert_eq!(transcript.session_id, "a");
        assert_eq!(transcript.summary, "summary a");
        assert_eq!(ctrl.transcript_status(), LoadStatus::Loaded);

        // clearing is synchronous: no await needed
        let pending = ctrl.load_transcript(None);
        assert!(ctrl.transcript().is_none());
        assert_eq!(ctrl.transcript_status(), LoadStatus::Idle);
        assert!(!pending.await);
    }

    #[tokio::test]
    async fn test_clear_invalidates_in_flight_fetch() {
        let ctrl = controller(&["a"]);
        let ticket = ctrl.begin_transcript(Some(SessionId::from("a"))).unwrap();
        ctrl.begin_transcript(None);

        assert!(!ctrl.fetch_transcript(ticket).await);
        assert!(ctrl.transcript().is_none());
        assert_eq!(ctrl.transcript_status(), LoadStatus::Idle);
    }

    #[tokio::test]
    async fn test_transcript_failure_is_reported() {
        let ctrl = controller(&["a"]);
        ctrl.source().set_failing(true);
        let mut events = ctrl.event_bus().subscribe();

        assert!(ctrl.load_transcript(Some(SessionId::from("a"))).await);
        assert!(ctrl.transcript().is_none());
        assert!(ctrl.transcript_status().error().is_some());
        assert_eq!(
            events.recv().await.unwrap(),
            DataEvent::TranscriptFailed(SessionId::from("a"))
        );
    }

    #[tokio::test]
    async fn test_delete_removes_exact_id() {
        let ctrl = controller(&["a", "ab", "b"]);
        ctrl.load_sessions(10).await;

        assert!(ctrl.delete_session(&SessionId::from("a")).await);
        let ids: Vec<String> = ctrl.sessions().into_iter().map(|s| s.id.into_inner()).collect();
        assert_eq!(ids, vec!["ab", "b"]);

        ctrl.source().set_failing(true);
        assert!(!ctrl.delete_session(&SessionId::from("b")).await);
        assert_eq!(ctrl.sessions().len(), 2);
    }

    #[tokio::test]
    async fn test_favorite_uses_confirmed_value() {
        let ctrl = controller(&["a", "b"]);
        ctrl.load_sessions(10).await;

        *ctrl.source().favorite_reply.lock() = true;
        assert_eq!(ctrl.toggle_favorite(&SessionId::from("b")).await, Some(true));
        assert!(ctrl.session(&SessionId::from("b")).unwrap().is_favorite);
        assert!(!ctrl.session(&SessionId::from("a")).unwrap().is_favorite);

        // source answers false even though local copy was true
        *ctrl.source().favorite_reply.lock() = false;
        assert_eq!(ctrl.toggle_favorite(&SessionId::from("b")).await, Some(false));
        assert!(!ctrl.session(&SessionId::from("b")).unwrap().is_favorite);

        ctrl.source().set_failing(true);
        assert_eq!(ctrl.toggle_favorite(&SessionId::from("a")).await, None);
        assert!(!ctrl.session(&SessionId::from("a")).unwrap().is_favorite);
    }

    #[tokio::test]
    async fn test_session_html_passthrough() {
        let ctrl = controller(&["a"]);
        assert_eq!(
            ctrl.session_html(&SessionId::from("a")).await.unwrap(),
            "<html>a</html>"
        );
    }
}
