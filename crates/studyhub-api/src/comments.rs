use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use studyhub_db::models::CommentRow;
use studyhub_types::api::{Claims, CreateCommentRequest};
use studyhub_types::models::Comment;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::guard::{self, Ownership};
use crate::{blocking, parse_id, parse_timestamp};

/// Any current member of the element's group may comment.
pub async fn create_comment(
    State(state): State<AppState>,
    Path(element_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.body.trim().is_empty() {
        return Err(ApiError::BadRequest("comment body must not be empty"));
    }

    let comment_id = Uuid::new_v4();
    let db = state.clone();
    let eid = element_id.to_string();
    let cid = comment_id.to_string();
    let uid = claims.sub.to_string();
    let row = blocking(move || {
        let element = db.db.get_element(&eid)?.ok_or(ApiError::NotFound)?;
        let ownership =
            Ownership::of_element(&db.db, &element)?.ok_or(ApiError::NotFound)?;
        if !guard::can_view(&db.db, &uid, &ownership)? {
            return Err(ApiError::Forbidden);
        }
        db.db.create_comment(&cid, &eid, &uid, &req.body)?;
        db.db.get_comment(&cid)?.ok_or(ApiError::NotFound)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(comment_from_row(row))))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let cid = comment_id.to_string();
    let uid = claims.sub.to_string();
    blocking(move || {
        let comment = db.db.get_comment(&cid)?.ok_or(ApiError::NotFound)?;
        let ownership =
            Ownership::of_comment(&db.db, &comment)?.ok_or(ApiError::NotFound)?;
        if !guard::can_mutate(&db.db, &uid, &ownership)? {
            return Err(ApiError::Forbidden);
        }
        db.db.delete_comment(&cid)?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn comment_from_row(row: CommentRow) -> Comment {
    Comment {
        id: parse_id(&row.id, "comment id"),
        element_id: parse_id(&row.element_id, "comment element_id"),
        creator_id: parse_id(&row.creator_id, "comment creator_id"),
        creator_username: row.creator_username,
        body: row.body,
        created_at: parse_timestamp(&row.created_at, "comment created_at"),
    }
}
