//! Message content normalization
//!
//! Turns [`MessageContent`] (plain text or typed blocks) into an ordered
//! list of [`RenderableBlock`]s. Unknown block shapes are skipped without
//! error so newer transcript formats keep rendering.

use crate::models::{ContentBlock, ImageSource, MessageContent, RenderableBlock, Role, TranscriptEntry};
use serde::Serialize;

/// Media type assumed for base64 images that do not declare one
const DEFAULT_MEDIA_TYPE: &str = "image/png";

/// Normalize message content into renderable blocks, preserving order
///
/// A plain string always yields exactly one text block, even when empty.
/// An empty result means the message has nothing to display.
pub fn normalize(content: &MessageContent) -> Vec<RenderableBlock> {
    match content {
        MessageContent::Text(text) => vec![RenderableBlock::Text { text: text.clone() }],
        MessageContent::Blocks(blocks) => blocks.iter().filter_map(normalize_block).collect(),
    }
}

fn normalize_block(block: &ContentBlock) -> Option<RenderableBlock> {
    match block {
        ContentBlock::Text { text } if !text.is_empty() => {
            Some(RenderableBlock::Text { text: text.clone() })
        }
        ContentBlock::Image { source } => image_url(source).map(|url| RenderableBlock::Image { url }),
        _ => None,
    }
}

/// URL for an image source: a data URI for base64 payloads, the raw URL otherwise
pub fn image_url(source: &ImageSource) -> Option<String> {
    match source {
        ImageSource::Base64 {
            media_type,
            data: Some(data),
        } => {
            let media_type = media_type
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_MEDIA_TYPE);
            Some(format!("data:{};base64,{}", media_type, data))
        }
        ImageSource::Url { url: Some(url) } => Some(url.clone()),
        _ => None,
    }
}

/// A transcript entry ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayMessage {
    pub role: Role,
    pub timestamp: String,
    pub blocks: Vec<RenderableBlock>,
}

/// Entries that have something to show, in transcript order
///
/// Compact-summary entries are dropped regardless of content, as are entries
/// whose normalized blocks are empty or only whitespace text.
pub fn displayable_messages(entries: &[TranscriptEntry]) -> Vec<DisplayMessage> {
    entries
        .iter()
        .filter(|entry| !entry.is_compact_summary)
        .filter_map(|entry| {
            let blocks = normalize(&entry.content);
            if !has_visible_content(&blocks) {
                return None;
            }
            Some(DisplayMessage {
                role: entry.role,
                timestamp: entry.timestamp.clone(),
                blocks,
            })
        })
        .collect()
}

fn has_visible_content(blocks: &[RenderableBlock]) -> bool {
    blocks.iter().any(|block| match block {
        RenderableBlock::Text { text } => !text.trim().is_empty(),
        RenderableBlock::Image { .. } => true,
    })
}
