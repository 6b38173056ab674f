use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public view of a user. Never carries credential material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A collaboration space. The creator is immutable and is always a member
/// at creation time; members join and leave through the membership relation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub creator_id: Uuid,
    pub creator_username: String,
    pub member_count: usize,
    pub created_at: DateTime<Utc>,
    pub last_edit_at: Option<DateTime<Utc>>,
}

/// A named subdivision within a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tab {
    pub id: Uuid,
    pub group_id: Uuid,
    pub creator_id: Uuid,
    pub creator_username: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_edit_at: Option<DateTime<Utc>>,
}

/// A content item within a tab: text plus an optional uploaded image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: Uuid,
    pub tab_id: Uuid,
    pub creator_id: Uuid,
    pub creator_username: String,
    pub name: String,
    pub body: String,
    pub image_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub last_edit_at: Option<DateTime<Utc>>,
}

/// A reply attached to an element. Comments are never edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub element_id: Uuid,
    pub creator_id: Uuid,
    pub creator_username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
