//! Data models for ccbrowse

pub mod session;
pub mod transcript;

pub use session::{FavoriteResponse, Session, SessionId, SessionsResponse};
pub use transcript::{
    ContentBlock, ImageSource, MessageContent, RenderableBlock, Role, SessionLine, SessionMessage,
    Transcript, TranscriptEntry, TranscriptResponse,
};
