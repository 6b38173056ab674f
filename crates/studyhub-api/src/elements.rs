use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use studyhub_db::Database;
use studyhub_db::models::ElementRow;
use studyhub_types::api::{
    Claims, CreateElementRequest, ElementDetailResponse, UpdateElementRequest,
};
use studyhub_types::models::Element;

use crate::auth::AppState;
use crate::comments::comment_from_row;
use crate::error::ApiError;
use crate::guard::{self, Ownership};
use crate::{blocking, parse_id, parse_timestamp};

const NAME_MAX: usize = 45;

fn validate(name: &str, body: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() || name.len() > NAME_MAX {
        return Err(ApiError::BadRequest("element name must be 1-45 characters"));
    }
    if body.trim().is_empty() {
        return Err(ApiError::BadRequest("element body must not be empty"));
    }
    Ok(())
}

fn check_image(db: &Database, image_id: Option<&str>) -> Result<(), ApiError> {
    if let Some(id) = image_id {
        if db.get_file(id)?.is_none() {
            return Err(ApiError::BadRequest("image_id does not reference an uploaded file"));
        }
    }
    Ok(())
}

pub async fn create_element(
    State(state): State<AppState>,
    Path(tab_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateElementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req.name, &req.body)?;

    let element_id = Uuid::new_v4();
    let db = state.clone();
    let tid = tab_id.to_string();
    let eid = element_id.to_string();
    let uid = claims.sub.to_string();
    let row = blocking(move || {
        let tab = db.db.get_tab(&tid)?.ok_or(ApiError::NotFound)?;
        if !guard::can_view(&db.db, &uid, &Ownership::of_tab(&tab))? {
            return Err(ApiError::Forbidden);
        }
        let image_id = req.image_id.map(|id| id.to_string());
        check_image(&db.db, image_id.as_deref())?;
        db.db.create_element(&eid, &tid, &uid, &req.name, &req.body, image_id.as_deref())?;
        db.db.get_element(&eid)?.ok_or(ApiError::NotFound)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(element_from_row(row))))
}

pub async fn element_detail(
    State(state): State<AppState>,
    Path(element_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let eid = element_id.to_string();
    let uid = claims.sub.to_string();

    let (element, comments) = blocking(move || {
        let element = db.db.get_element(&eid)?.ok_or(ApiError::NotFound)?;
        let ownership =
            Ownership::of_element(&db.db, &element)?.ok_or(ApiError::NotFound)?;
        if !guard::can_view(&db.db, &uid, &ownership)? {
            return Err(ApiError::Forbidden);
        }
        let comments = db.db.comments_in_element(&eid)?;
        Ok((element, comments))
    })
    .await?;

    Ok(Json(ElementDetailResponse {
        element: element_from_row(element),
        comments: comments.into_iter().map(comment_from_row).collect(),
    }))
}

/// The request's `image_id` is the full new value: `null` clears a
/// previously attached image.
pub async fn update_element(
    State(state): State<AppState>,
    Path(element_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateElementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req.name, &req.body)?;

    let db = state.clone();
    let eid = element_id.to_string();
    let uid = claims.sub.to_string();
    let row = blocking(move || {
        let element = db.db.get_element(&eid)?.ok_or(ApiError::NotFound)?;
        let ownership =
            Ownership::of_element(&db.db, &element)?.ok_or(ApiError::NotFound)?;
        if !guard::can_mutate(&db.db, &uid, &ownership)? {
            return Err(ApiError::Forbidden);
        }
        let image_id = req.image_id.map(|id| id.to_string());
        check_image(&db.db, image_id.as_deref())?;
        db.db.update_element(&eid, &req.name, &req.body, image_id.as_deref())?;
        db.db.get_element(&eid)?.ok_or(ApiError::NotFound)
    })
    .await?;

    Ok(Json(element_from_row(row)))
}

pub async fn delete_element(
    State(state): State<AppState>,
    Path(element_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let eid = element_id.to_string();
    let uid = claims.sub.to_string();
    blocking(move || {
        let element = db.db.get_element(&eid)?.ok_or(ApiError::NotFound)?;
        let ownership =
            Ownership::of_element(&db.db, &element)?.ok_or(ApiError::NotFound)?;
        if !guard::can_mutate(&db.db, &uid, &ownership)? {
            return Err(ApiError::Forbidden);
        }
        db.db.delete_element(&eid)?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn element_from_row(row: ElementRow) -> Element {
    Element {
        id: parse_id(&row.id, "element id"),
        tab_id: parse_id(&row.tab_id, "element tab_id"),
        creator_id: parse_id(&row.creator_id, "element creator_id"),
        creator_username: row.creator_username,
        name: row.name,
        body: row.body,
        image_id: row.image_id.as_deref().map(|raw| parse_id(raw, "element image_id")),
        created_at: parse_timestamp(&row.created_at, "element created_at"),
        last_edit_at: row
            .last_edit_at
            .as_deref()
            .map(|t| parse_timestamp(t, "element last_edit_at")),
    }
}
