use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use batchtone_engine::identity::Session;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/sessions
///
/// Create an anonymous session. The returned token goes in
/// `Authorization: Bearer <token>` on later requests.
pub async fn create_session(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<DataResponse<Session>>)> {
    let session = state.engine.identity().create_anonymous_session()?;
    tracing::info!(user_id = %session.user_id, "Anonymous session created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: session })))
}
