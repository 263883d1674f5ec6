//! Handlers for batches: first upload, adding photos, polling reads and the
//! two batch-level edit commits.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use batchtone_core::progress::{BatchProgress, POLL_INTERVAL_SECS};
use batchtone_core::settings::AdjustmentVector;
use batchtone_core::types::DbId;
use batchtone_db::models::batch::Batch;
use batchtone_engine::identity::Session;
use batchtone_engine::polling::ImageView;
use batchtone_engine::PropagationReport;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::read_upload_files;
use crate::middleware::auth::{MaybeSessionUser, SessionUser};
use crate::response::DataResponse;
use crate::state::AppState;

// ── First upload ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BatchCreated {
    /// Present when the caller had no session and one was created.
    pub session: Option<Session>,
    pub batch: Batch,
    pub image: ImageView,
}

/// POST /api/v1/batches
///
/// Start a batch from exactly one uploaded photo. Without a session token an
/// anonymous session is created and returned.
pub async fn create_batch(
    State(state): State<AppState>,
    MaybeSessionUser(identity): MaybeSessionUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<BatchCreated>>)> {
    let mut files = read_upload_files(&mut multipart).await?;
    if files.len() != 1 {
        return Err(AppError::BadRequest(format!(
            "Expected exactly one file for the first upload, got {}",
            files.len()
        )));
    }
    let file = files.remove(0);

    let first = state.engine.start_batch(identity, file).await?;
    let image = ImageView::resolve(&first.image, &first.batch.template)?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: BatchCreated {
                session: first.session,
                batch: first.batch,
                image,
            },
        }),
    ))
}

// ── Add photos ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PhotosAdded {
    pub images: Vec<ImageView>,
    pub skipped: usize,
    /// Set when the upload was truncated at the batch limit.
    pub notice: Option<String>,
}

/// POST /api/v1/batches/{id}/images
///
/// Add photos to the caller's batch. Files beyond the batch limit are
/// skipped and reported in `notice`.
pub async fn add_images(
    State(state): State<AppState>,
    user: SessionUser,
    Path(batch_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<PhotosAdded>>)> {
    let files = read_upload_files(&mut multipart).await?;
    let outcome = state
        .engine
        .add_photos(&user.identity, batch_id, files)
        .await?;

    let batch = state.engine.get_batch(batch_id).await?;
    let images = outcome
        .images
        .iter()
        .map(|image| ImageView::resolve(image, &batch.template))
        .collect::<Result<Vec<_>, _>>()?;
    let notice = outcome.notice(state.engine.limits().max_images_per_batch);

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: PhotosAdded {
                images,
                skipped: outcome.skipped,
                notice,
            },
        }),
    ))
}

// ── Reads ────────────────────────────────────────────────────────────

/// GET /api/v1/batches/{id}
pub async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Batch>>> {
    let batch = state.engine.get_batch(batch_id).await?;
    Ok(Json(DataResponse { data: batch }))
}

/// GET /api/v1/batches/{id}/images
///
/// Polling read: every image in upload order with its status and, once
/// `done`, its edited URL.
pub async fn list_images(
    State(state): State<AppState>,
    Path(batch_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ImageView>>>> {
    let images = state.engine.list_images(batch_id).await?;
    Ok(Json(DataResponse { data: images }))
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    #[serde(flatten)]
    pub counts: BatchProgress,
    pub percent_done: u8,
    pub all_done: bool,
    /// How often clients should re-read the batch.
    pub poll_interval_secs: u64,
}

/// GET /api/v1/batches/{id}/progress
pub async fn get_progress(
    State(state): State<AppState>,
    Path(batch_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProgressResponse>>> {
    let counts = state.engine.progress(batch_id).await?;
    Ok(Json(DataResponse {
        data: ProgressResponse {
            percent_done: counts.percent_done(),
            all_done: counts.all_done(),
            poll_interval_secs: POLL_INTERVAL_SECS,
            counts,
        },
    }))
}

// ── Edit commits ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FinalizeTemplate {
    pub template: AdjustmentVector,
    /// Photo the template was edited on; always re-armed.
    pub template_image_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct TemplateSaved {
    pub batch: Batch,
    pub rearmed: usize,
}

/// PUT /api/v1/batches/{id}/template
///
/// Finalize a template edit: replace the template wholesale and re-arm
/// affected photos.
pub async fn finalize_template(
    State(state): State<AppState>,
    Path(batch_id): Path<DbId>,
    Json(input): Json<FinalizeTemplate>,
) -> AppResult<Json<DataResponse<TemplateSaved>>> {
    let update = state
        .engine
        .finalize_template_edit(batch_id, input.template_image_id, &input.template)
        .await?;
    Ok(Json(DataResponse {
        data: TemplateSaved {
            batch: update.batch,
            rearmed: update.rearmed,
        },
    }))
}

/// Body of an adjust-session commit.
#[derive(Debug, Deserialize)]
pub struct AdjustCommit {
    /// Vector the session opened with.
    pub baseline: AdjustmentVector,
    pub edited: AdjustmentVector,
}

/// POST /api/v1/batches/{id}/apply-to-all
///
/// Apply adjusted edits to every photo: the edited vector becomes the
/// template and the changed fields are merged into every override.
pub async fn apply_to_all(
    State(state): State<AppState>,
    Path(batch_id): Path<DbId>,
    Json(input): Json<AdjustCommit>,
) -> AppResult<Json<DataResponse<PropagationReport>>> {
    let report = state
        .engine
        .apply_adjusted_to_all(batch_id, &input.baseline, &input.edited)
        .await?;
    Ok(Json(DataResponse { data: report }))
}
