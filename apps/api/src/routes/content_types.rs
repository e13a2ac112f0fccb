use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::content_type::{listed_ids, ContentTypeRow};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ContentTypesResponse {
    pub success: bool,
    #[serde(rename = "contentTypes")]
    pub content_types: Vec<ContentTypeRow>,
}

/// GET /api/content-types
/// Lists the fixed set of reference content types offered for upload and output.
pub async fn handle_list_content_types(
    State(state): State<AppState>,
) -> Result<Json<ContentTypesResponse>, AppError> {
    let content_types = state.store.content_types_by_ids(&listed_ids()).await?;
    Ok(Json(ContentTypesResponse {
        success: true,
        content_types,
    }))
}
