pub mod batches;
pub mod health;
pub mod images;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /sessions                           create anonymous session (POST)
///
/// /batches                            first upload (POST, multipart)
/// /batches/{id}                       get batch with template
/// /batches/{id}/images                list (GET, polling), add (POST, multipart, auth)
/// /batches/{id}/progress              done/total counts
/// /batches/{id}/template              finalize template edit (PUT)
/// /batches/{id}/apply-to-all          apply adjusted edits to all (POST)
///
/// /images/{id}/session                open edit session (GET)
/// /images/{id}/override               save for this photo (PUT)
///
/// /preview                            map a vector to its preview (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(handlers::sessions::create_session))
        .nest("/batches", batches::router())
        .nest("/images", images::router())
        .route("/preview", post(handlers::preview::preview))
}
