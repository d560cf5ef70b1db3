//! Event bus for ccbrowse using tokio::broadcast
//!
//! The data controller publishes here after every state change so the
//! terminal browser knows when to redraw.

use crate::models::SessionId;
use tokio::sync::broadcast;

/// Events emitted by the data controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataEvent {
    /// Session collection replaced
    SessionsLoaded { count: usize },
    /// Session collection could not be fetched
    SessionsFailed(String),
    /// Transcript for the current selection is available
    TranscriptLoaded(SessionId),
    /// Transcript for the current selection failed
    TranscriptFailed(SessionId),
    SessionDeleted(SessionId),
    FavoriteChanged { id: SessionId, is_favorite: bool },
}

/// Event bus for broadcasting data events
///
/// Uses tokio::broadcast for multi-consumer support.
pub struct EventBus {
    sender: broadcast::Sender<DataEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (256 events)
    pub fn default_capacity() -> Self {
        Self::new(256)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: DataEvent) {
        // no subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DataEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
