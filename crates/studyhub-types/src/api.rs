use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Comment, Element, Group, Tab, User};

// -- JWT Claims --

/// JWT claims shared between token issuance (studyhub-api auth handlers)
/// and the bearer middleware. Canonical definition lives here so the two
/// sides cannot drift apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Groups --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateGroupRequest {
    pub name: String,
    pub description: String,
}

/// Full group page: the group itself, its tabs, and its member list.
#[derive(Debug, Serialize)]
pub struct GroupDetailResponse {
    pub group: Group,
    pub tabs: Vec<Tab>,
    pub members: Vec<User>,
}

// -- Tabs --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTabRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTabRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TabDetailResponse {
    pub tab: Tab,
    pub elements: Vec<Element>,
}

// -- Elements --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateElementRequest {
    pub name: String,
    pub body: String,
    #[serde(default)]
    pub image_id: Option<Uuid>,
}

/// `image_id` is the full new value: `null` (or absent) clears any
/// previously attached image.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateElementRequest {
    pub name: String,
    pub body: String,
    #[serde(default)]
    pub image_id: Option<Uuid>,
}

/// Element page: the element plus its comments, newest first.
#[derive(Debug, Serialize)]
pub struct ElementDetailResponse {
    pub element: Element,
    pub comments: Vec<Comment>,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub body: String,
}

// -- Files --

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_id: Uuid,
    pub size: u64,
}
