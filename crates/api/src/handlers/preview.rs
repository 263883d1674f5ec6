use axum::Json;
use batchtone_core::settings::{clamp_or_reject, AdjustmentVector, BoundsPolicy};
use batchtone_engine::editing::Preview;

use crate::error::AppResult;
use crate::response::DataResponse;

/// POST /api/v1/preview
///
/// Map a complete vector to its preview transform and CSS strings.
pub async fn preview(Json(vector): Json<AdjustmentVector>) -> AppResult<Json<DataResponse<Preview>>> {
    let vector = clamp_or_reject(&vector, BoundsPolicy::Reject)?;
    Ok(Json(DataResponse {
        data: Preview::of(&vector),
    }))
}
