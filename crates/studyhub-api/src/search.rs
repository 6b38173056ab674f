use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use studyhub_types::api::Claims;
use studyhub_types::models::Group;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::groups::group_from_row;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Case-insensitive substring search over group name, description and the
/// creator's identity. An unfilled search box returns nothing; it must
/// not dump every group on the platform.
pub async fn search_groups(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Group>>, ApiError> {
    if query.q.trim().is_empty() {
        return Ok(Json(Vec::new()));
    }

    let db = state.clone();
    let rows = blocking(move || Ok(db.db.search_groups(&query.q)?)).await?;

    Ok(Json(rows.into_iter().map(group_from_row).collect()))
}
