use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use studyhub_db::models::{GroupRow, MemberRow};
use studyhub_types::api::{Claims, CreateGroupRequest, GroupDetailResponse, UpdateGroupRequest};
use studyhub_types::models::{Group, User};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::guard::{self, Ownership};
use crate::tabs::tab_from_row;
use crate::{blocking, parse_id, parse_timestamp};

const NAME_MAX: usize = 40;
const DESCRIPTION_MAX: usize = 90;

fn validate(name: &str, description: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() || name.len() > NAME_MAX {
        return Err(ApiError::BadRequest("group name must be 1-40 characters"));
    }
    if description.trim().is_empty() || description.len() > DESCRIPTION_MAX {
        return Err(ApiError::BadRequest("group description must be 1-90 characters"));
    }
    Ok(())
}

pub async fn create_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req.name, &req.description)?;

    let group_id = Uuid::new_v4();
    let db = state.clone();
    let gid = group_id.to_string();
    let uid = claims.sub.to_string();
    let row = blocking(move || {
        db.db.create_group(&gid, &req.name, &req.description, &uid)?;
        db.db.get_group(&gid)?.ok_or(ApiError::NotFound)
    })
    .await?;

    info!("User '{}' created group '{}'", claims.username, row.name);

    Ok((StatusCode::CREATED, Json(group_from_row(row))))
}

pub async fn my_groups(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let rows = blocking(move || Ok(db.db.groups_for_user(&uid)?)).await?;

    Ok(Json(rows.into_iter().map(group_from_row).collect::<Vec<_>>()))
}

pub async fn group_detail(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let gid = group_id.to_string();
    let uid = claims.sub.to_string();

    let (group, tabs, members) = blocking(move || {
        let group = db.db.get_group(&gid)?.ok_or(ApiError::NotFound)?;
        if !guard::can_view(&db.db, &uid, &Ownership::of_group(&group))? {
            return Err(ApiError::Forbidden);
        }
        let tabs = db.db.tabs_in_group(&gid)?;
        let members = db.db.members_of_group(&gid)?;
        Ok((group, tabs, members))
    })
    .await?;

    Ok(Json(GroupDetailResponse {
        group: group_from_row(group),
        tabs: tabs.into_iter().map(tab_from_row).collect(),
        members: members.into_iter().map(member_from_row).collect(),
    }))
}

pub async fn update_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req.name, &req.description)?;

    let db = state.clone();
    let gid = group_id.to_string();
    let uid = claims.sub.to_string();
    let row = blocking(move || {
        let group = db.db.get_group(&gid)?.ok_or(ApiError::NotFound)?;
        if !guard::can_mutate(&db.db, &uid, &Ownership::of_group(&group))? {
            return Err(ApiError::Forbidden);
        }
        db.db.update_group(&gid, &req.name, &req.description)?;
        db.db.get_group(&gid)?.ok_or(ApiError::NotFound)
    })
    .await?;

    Ok(Json(group_from_row(row)))
}

pub async fn delete_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let gid = group_id.to_string();
    let uid = claims.sub.to_string();
    let name = blocking(move || {
        let group = db.db.get_group(&gid)?.ok_or(ApiError::NotFound)?;
        if !guard::can_mutate(&db.db, &uid, &Ownership::of_group(&group))? {
            return Err(ApiError::Forbidden);
        }
        // Tabs, elements, comments and memberships go with it (cascade).
        db.db.delete_group(&gid)?;
        Ok(group.name)
    })
    .await?;

    info!("User '{}' deleted group '{}'", claims.username, name);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn join_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let gid = group_id.to_string();
    let uid = claims.sub.to_string();
    let row = blocking(move || {
        if db.db.get_group(&gid)?.is_none() {
            return Err(ApiError::NotFound);
        }
        // Already a member? The insert is a no-op.
        db.db.add_member(&gid, &uid)?;
        db.db.get_group(&gid)?.ok_or(ApiError::NotFound)
    })
    .await?;

    info!("User '{}' joined group '{}'", claims.username, row.name);

    Ok(Json(group_from_row(row)))
}

pub async fn leave_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let gid = group_id.to_string();
    let uid = claims.sub.to_string();
    let left = blocking(move || {
        if db.db.get_group(&gid)?.is_none() {
            return Err(ApiError::NotFound);
        }
        Ok(db.db.remove_member(&gid, &uid)?)
    })
    .await?;

    if !left {
        return Err(ApiError::Forbidden);
    }

    Ok(Json(serde_json::json!({ "left": true })))
}

pub(crate) fn group_from_row(row: GroupRow) -> Group {
    Group {
        id: parse_id(&row.id, "group id"),
        name: row.name,
        description: row.description,
        creator_id: parse_id(&row.creator_id, "group creator_id"),
        creator_username: row.creator_username,
        member_count: row.member_count.max(0) as usize,
        created_at: parse_timestamp(&row.created_at, "group created_at"),
        last_edit_at: row
            .last_edit_at
            .as_deref()
            .map(|t| parse_timestamp(t, "group last_edit_at")),
    }
}

pub(crate) fn member_from_row(row: MemberRow) -> User {
    User {
        id: parse_id(&row.user_id, "member user_id"),
        username: row.username,
        first_name: row.first_name,
        last_name: row.last_name,
        created_at: parse_timestamp(&row.created_at, "member created_at"),
    }
}
