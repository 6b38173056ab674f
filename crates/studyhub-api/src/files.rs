use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

use studyhub_types::api::{Claims, UploadResponse};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

/// 5 MB cap for element images.
const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// POST /files: accepts raw image bytes (application/octet-stream),
/// saves to the upload directory, inserts a DB row, returns the id that
/// elements reference via `image_id`.
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("empty upload"));
    }
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(ApiError::PayloadTooLarge);
    }

    let file_id = Uuid::new_v4();
    let size = bytes.len() as i64;

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("creating upload dir: {e}")))?;

    let path = state.upload_dir.join(file_id.to_string());
    let mut file = tokio::fs::File::create(&path)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("creating {}: {e}", path.display())))?;
    file.write_all(&bytes)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("writing {}: {e}", path.display())))?;

    let db = state.clone();
    let fid = file_id.to_string();
    let uid = claims.sub.to_string();
    blocking(move || Ok(db.db.insert_file(&fid, &uid, size)?)).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            file_id,
            size: size as u64,
        }),
    ))
}

/// GET /files/{file_id}: returns the stored blob. The typed UUID path
/// parameter keeps arbitrary strings away from the filesystem.
pub async fn download_file(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let fid = file_id.to_string();
    let row = blocking(move || Ok(db.db.get_file(&fid)?)).await?;

    if row.is_none() {
        return Err(ApiError::NotFound);
    }

    let path = state.upload_dir.join(file_id.to_string());
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        warn!("Upload {} has a DB row but no blob on disk: {}", file_id, e);
        ApiError::NotFound
    })?;

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes))
}
