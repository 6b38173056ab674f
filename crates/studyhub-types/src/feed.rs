use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Comment, Element, Tab};

/// One entry in the activity feed. Tagged so the display layer can
/// dispatch on `kind` without inspecting the payload shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum FeedItem {
    Tab(Tab),
    Element(Element),
    Comment(Comment),
}

impl FeedItem {
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            FeedItem::Tab(tab) => tab.created_at,
            FeedItem::Element(element) => element.created_at,
            FeedItem::Comment(comment) => comment.created_at,
        }
    }
}

/// A single page of the feed. Pages are 1-indexed; `total_pages` is at
/// least 1 even when the feed is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPage {
    pub page: u32,
    pub total_pages: u32,
    pub total_entries: usize,
    pub entries: Vec<FeedItem>,
}
