//! ccbrowse-core - Core library for ccbrowse
//!
//! Session models, content normalization, grouping, list and data
//! controllers, plus the local and HTTP session sources.

pub mod client;
pub mod collapse;
pub mod content;
pub mod controller;
pub mod error;
pub mod event;
pub mod grouping;
pub mod list;
pub mod models;
pub mod preferences;
pub mod source;
pub mod store;

#[cfg(test)]
mod test_support;

pub use client::HttpSessionSource;
pub use collapse::CollapseState;
pub use content::{displayable_messages, normalize, DisplayMessage};
pub use controller::{LoadStatus, SessionDataController, SessionsTicket, TranscriptTicket};
pub use error::{CoreError, CoreResult};
pub use event::{DataEvent, EventBus};
pub use grouping::{group_keys, group_sessions, GroupMode, SessionGroup};
pub use list::{GroupView, ListRow, Navigation, SessionListController};
pub use preferences::BrowsePreferences;
pub use source::{AnySource, SessionSource};
pub use store::LocalSessionStore;
