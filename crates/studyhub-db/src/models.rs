/// Database row types that map directly to SQLite rows.
/// Distinct from the studyhub-types API models to keep the DB layer
/// independent of the HTTP surface.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: String,
}

pub struct GroupRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub creator_id: String,
    pub creator_username: String,
    pub member_count: i64,
    pub created_at: String,
    pub last_edit_at: Option<String>,
}

pub struct TabRow {
    pub id: String,
    pub group_id: String,
    pub creator_id: String,
    pub creator_username: String,
    pub name: String,
    pub created_at: String,
    pub last_edit_at: Option<String>,
}

pub struct ElementRow {
    pub id: String,
    pub tab_id: String,
    pub creator_id: String,
    pub creator_username: String,
    pub name: String,
    pub body: String,
    pub image_id: Option<String>,
    pub created_at: String,
    pub last_edit_at: Option<String>,
}

pub struct CommentRow {
    pub id: String,
    pub element_id: String,
    pub creator_id: String,
    pub creator_username: String,
    pub body: String,
    pub created_at: String,
}

/// A group member, joined against the users table. Carries no credential
/// material so it can cross the API boundary after conversion.
pub struct MemberRow {
    pub user_id: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: String,
}

pub struct FileRow {
    pub id: String,
    pub owner_id: String,
    pub size: i64,
    pub created_at: String,
}
