use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::batches;
use crate::state::AppState;

/// Routes mounted at `/batches`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(batches::create_batch))
        .route("/{id}", get(batches::get_batch))
        .route(
            "/{id}/images",
            get(batches::list_images).post(batches::add_images),
        )
        .route("/{id}/progress", get(batches::get_progress))
        .route("/{id}/template", put(batches::finalize_template))
        .route("/{id}/apply-to-all", post(batches::apply_to_all))
}
