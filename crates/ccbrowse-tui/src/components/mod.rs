pub mod session_list;
pub mod transcript_view;

pub use transcript_view::TranscriptView;
