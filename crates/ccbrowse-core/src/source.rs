//! Data-source abstraction for sessions and transcripts
//!
//! Implemented by [`LocalSessionStore`] (reads `~/.claude/projects` directly)
//! and [`HttpSessionSource`] (talks to a running `ccbrowse serve`).

use crate::client::HttpSessionSource;
use crate::error::CoreResult;
use crate::models::{Session, SessionId, TranscriptResponse};
use crate::store::LocalSessionStore;
use std::future::Future;

/// Retrieval and mutation contract consumed by the data controller
///
/// Any failure is reported as an error with no partial result.
pub trait SessionSource: Send + Sync {
    /// Up to `limit` sessions, in source order
    fn list_sessions(&self, limit: usize) -> impl Future<Output = CoreResult<Vec<Session>>> + Send;

    /// Full transcript of one session
    fn transcript(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = CoreResult<TranscriptResponse>> + Send;

    /// Pre-rendered HTML view of one session
    fn session_html(&self, id: &SessionId) -> impl Future<Output = CoreResult<String>> + Send;

    fn delete_session(&self, id: &SessionId) -> impl Future<Output = CoreResult<()>> + Send;

    /// Flip the favorite flag; resolves to the authoritative new value
    fn toggle_favorite(&self, id: &SessionId) -> impl Future<Output = CoreResult<bool>> + Send;
}

/// Either a local store or a remote server, chosen at startup
pub enum AnySource {
    Local(LocalSessionStore),
    Remote(HttpSessionSource),
}

impl AnySource {
    /// Human-readable origin for status lines
    pub fn describe(&self) -> String {
        match self {
            AnySource::Local(store) => store.projects_dir().display().to_string(),
            AnySource::Remote(client) => client.base_url().to_string(),
        }
    }
}

impl SessionSource for AnySource {
    async fn list_sessions(&self, limit: usize) -> CoreResult<Vec<Session>> {
        match self {
            AnySource::Local(store) => store.list_sessions(limit).await,
            AnySource::Remote(client) => client.list_sessions(limit).await,
        }
    }

    async fn transcript(&self, id: &SessionId) -> CoreResult<TranscriptResponse> {
        match self {
            AnySource::Local(store) => store.transcript(id).await,
            AnySource::Remote(client) => client.transcript(id).await,
        }
    }

    async fn session_html(&self, id: &SessionId) -> CoreResult<String> {
        match self {
            AnySource::Local(store) => store.session_html(id).await,
            AnySource::Remote(client) => client.session_html(id).await,
        }
    }

    async fn delete_session(&self, id: &SessionId) -> CoreResult<()> {
        match self {
            AnySource::Local(store) => store.delete_session(id).await,
            AnySource::Remote(client) => client.delete_session(id).await,
        }
    }

    async fn toggle_favorite(&self, id: &SessionId) -> CoreResult<bool> {
        match self {
            AnySource::Local(store) => store.toggle_favorite(id).await,
            AnySource::Remote(client) => client.toggle_favorite(id).await,
        }
    }
}
