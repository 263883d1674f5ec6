use axum::extract::{Path, Query, State};
use axum::Json;
use batchtone_core::types::DbId;
use batchtone_engine::editing::{EditMode, EditSession};
use batchtone_engine::polling::ImageView;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::batches::AdjustCommit;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SessionParams {
    /// Defaults to `adjust`.
    pub mode: Option<EditMode>,
    /// Required for `template` mode.
    pub batch_id: Option<DbId>,
}

/// GET /api/v1/images/{id}/session?mode=adjust|template&batch_id=
///
/// Open an editor on a photo. The returned `baseline` must be sent back
/// unchanged when the edit is committed.
pub async fn open_session(
    State(state): State<AppState>,
    Path(image_id): Path<DbId>,
    Query(params): Query<SessionParams>,
) -> AppResult<Json<DataResponse<EditSession>>> {
    let session = match params.mode.unwrap_or(EditMode::Adjust) {
        EditMode::Adjust => state.engine.open_adjust_session(image_id).await?,
        EditMode::Template => {
            let batch_id = params.batch_id.ok_or_else(|| {
                AppError::BadRequest("batch_id is required for a template session".into())
            })?;
            state.engine.open_template_session(batch_id, image_id).await?
        }
    };
    Ok(Json(DataResponse { data: session }))
}

/// PUT /api/v1/images/{id}/override
///
/// Save adjusted edits for this photo only.
pub async fn save_override(
    State(state): State<AppState>,
    Path(image_id): Path<DbId>,
    Json(input): Json<AdjustCommit>,
) -> AppResult<Json<DataResponse<ImageView>>> {
    let image = state
        .engine
        .save_for_this_photo(image_id, &input.baseline, &input.edited)
        .await?;
    let batch = state.engine.get_batch(image.batch_id).await?;
    let view = ImageView::resolve(&image, &batch.template)?;
    Ok(Json(DataResponse { data: view }))
}
