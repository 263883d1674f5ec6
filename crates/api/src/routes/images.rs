use axum::routing::{get, put};
use axum::Router;

use crate::handlers::images;
use crate::state::AppState;

/// Routes mounted at `/images`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/session", get(images::open_session))
        .route("/{id}/override", put(images::save_override))
}
