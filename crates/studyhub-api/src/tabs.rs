use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use studyhub_db::models::TabRow;
use studyhub_types::api::{Claims, CreateTabRequest, TabDetailResponse, UpdateTabRequest};
use studyhub_types::models::Tab;

use crate::auth::AppState;
use crate::elements::element_from_row;
use crate::error::ApiError;
use crate::guard::{self, Ownership};
use crate::{blocking, parse_id, parse_timestamp};

const NAME_MAX: usize = 45;

fn validate(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() || name.len() > NAME_MAX {
        return Err(ApiError::BadRequest("tab name must be 1-45 characters"));
    }
    Ok(())
}

/// Any current member of the group may open a tab in it.
pub async fn create_tab(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateTabRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req.name)?;

    let tab_id = Uuid::new_v4();
    let db = state.clone();
    let gid = group_id.to_string();
    let tid = tab_id.to_string();
    let uid = claims.sub.to_string();
    let row = blocking(move || {
        let group = db.db.get_group(&gid)?.ok_or(ApiError::NotFound)?;
        if !guard::can_view(&db.db, &uid, &Ownership::of_group(&group))? {
            return Err(ApiError::Forbidden);
        }
        db.db.create_tab(&tid, &gid, &uid, &req.name)?;
        db.db.get_tab(&tid)?.ok_or(ApiError::NotFound)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(tab_from_row(row))))
}

pub async fn tab_detail(
    State(state): State<AppState>,
    Path(tab_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let tid = tab_id.to_string();
    let uid = claims.sub.to_string();

    let (tab, elements) = blocking(move || {
        let tab = db.db.get_tab(&tid)?.ok_or(ApiError::NotFound)?;
        if !guard::can_view(&db.db, &uid, &Ownership::of_tab(&tab))? {
            return Err(ApiError::Forbidden);
        }
        let elements = db.db.elements_in_tab(&tid)?;
        Ok((tab, elements))
    })
    .await?;

    Ok(Json(TabDetailResponse {
        tab: tab_from_row(tab),
        elements: elements.into_iter().map(element_from_row).collect(),
    }))
}

pub async fn update_tab(
    State(state): State<AppState>,
    Path(tab_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateTabRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req.name)?;

    let db = state.clone();
    let tid = tab_id.to_string();
    let uid = claims.sub.to_string();
    let row = blocking(move || {
        let tab = db.db.get_tab(&tid)?.ok_or(ApiError::NotFound)?;
        if !guard::can_mutate(&db.db, &uid, &Ownership::of_tab(&tab))? {
            return Err(ApiError::Forbidden);
        }
        db.db.update_tab(&tid, &req.name)?;
        db.db.get_tab(&tid)?.ok_or(ApiError::NotFound)
    })
    .await?;

    Ok(Json(tab_from_row(row)))
}

pub async fn delete_tab(
    State(state): State<AppState>,
    Path(tab_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let tid = tab_id.to_string();
    let uid = claims.sub.to_string();
    blocking(move || {
        let tab = db.db.get_tab(&tid)?.ok_or(ApiError::NotFound)?;
        if !guard::can_mutate(&db.db, &uid, &Ownership::of_tab(&tab))? {
            return Err(ApiError::Forbidden);
        }
        db.db.delete_tab(&tid)?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn tab_from_row(row: TabRow) -> Tab {
    Tab {
        id: parse_id(&row.id, "tab id"),
        group_id: parse_id(&row.group_id, "tab group_id"),
        creator_id: parse_id(&row.creator_id, "tab creator_id"),
        creator_username: row.creator_username,
        name: row.name,
        created_at: parse_timestamp(&row.created_at, "tab created_at"),
        last_edit_at: row
            .last_edit_at
            .as_deref()
            .map(|t| parse_timestamp(t, "tab last_edit_at")),
    }
}
