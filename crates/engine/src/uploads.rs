//! First upload and adding photos to a batch.
//!
//! The image id is generated before the original is stored so the blob path
//! (`{user}/{batch}/{image}.{ext}`) and the inserted row agree. Files are
//! stored and inserted one at a time, which keeps the batch in upload order.

use batchtone_core::error::CoreError;
use batchtone_core::settings::AdjustmentVector;
use batchtone_core::types::DbId;
use batchtone_core::upload::{original_blob_path, plan_uploads, validate_file, ORIGINALS_BUCKET};
use batchtone_db::models::batch::{Batch, CreateBatch};
use batchtone_db::models::image::{CreateImage, Image};
use serde::Serialize;
use uuid::Uuid;

use crate::error::EngineError;
use crate::identity::{Identity, Session};
use crate::{Engine, EngineResult};

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Result of the first upload of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct FirstUpload {
    /// Set when the caller had no session and one was created.
    pub session: Option<Session>,
    pub batch: Batch,
    pub image: Image,
}

/// Result of adding photos to an existing batch.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub images: Vec<Image>,
    pub requested: usize,
    /// Files left out because the batch filled up.
    pub skipped: usize,
}

impl UploadOutcome {
    /// User-facing notice when the upload was truncated.
    pub fn notice(&self, limit: usize) -> Option<String> {
        (self.skipped > 0).then(|| {
            format!(
                "Only {} of {} photos added (batch limit is {limit})",
                self.images.len(),
                self.requested
            )
        })
    }
}

impl Engine {
    /// Create a batch from its first photo.
    ///
    /// Without an identity, an anonymous session is created and returned so
    /// the caller can keep using the batch.
    pub async fn start_batch(
        &self,
        identity: Option<Identity>,
        file: UploadFile,
    ) -> EngineResult<FirstUpload> {
        validate_file(&file.file_name, &file.content_type, file.size(), &self.limits)?;

        let (session, identity) = match identity {
            Some(identity) => (None, identity),
            None => {
                let session = self.identity.create_anonymous_session()?;
                tracing::info!(user_id = %session.user_id, "Anonymous session created");
                let identity = session.identity();
                (Some(session), identity)
            }
        };

        let batch_id = Uuid::now_v7();
        let image_id = Uuid::now_v7();
        let original_url = self.store_original(identity, batch_id, image_id, &file).await?;

        let limit = self.limits.max_images_per_batch;
        let inserted = async {
            let batch = self
                .rows
                .create_batch(&CreateBatch {
                    id: batch_id,
                    user_id: identity.user_id,
                    template: AdjustmentVector::default(),
                })
                .await?;
            let image = self
                .rows
                .create_image(
                    &CreateImage {
                        id: image_id,
                        batch_id,
                        original_url: original_url.clone(),
                    },
                    limit,
                )
                .await?
                .ok_or(EngineError::BatchFull { limit })?;
            Ok::<_, EngineError>((batch, image))
        }
        .await;
        let (batch, image) =
            inserted.inspect_err(|e| warn_orphaned(batch_id, image_id, &original_url, e))?;

        tracing::info!(%batch_id, %image_id, user_id = %identity.user_id, "Batch started");
        Ok(FirstUpload {
            session,
            batch,
            image,
        })
    }

    /// Add photos to a batch owned by `identity`.
    ///
    /// Files beyond the remaining slots are skipped (reported in the
    /// outcome); a batch with no free slot fails with
    /// [`EngineError::BatchFull`]. Every accepted file is validated before
    /// any is stored. The cap is enforced again by the store on each insert,
    /// so concurrent uploads never push a batch past it.
    pub async fn add_photos(
        &self,
        identity: &Identity,
        batch_id: DbId,
        files: Vec<UploadFile>,
    ) -> EngineResult<UploadOutcome> {
        let batch = self.get_batch(batch_id).await?;
        if batch.user_id != identity.user_id {
            return Err(EngineError::not_found("Batch", batch_id));
        }
        if files.is_empty() {
            return Err(CoreError::Validation("No files received".into()).into());
        }

        let existing = self.rows.count_images(batch_id).await?;
        let requested = files.len();
        let limit = self.limits.max_images_per_batch;
        let plan = plan_uploads(existing, requested, &self.limits);
        if plan.accepted == 0 {
            return Err(EngineError::BatchFull { limit });
        }

        let files: Vec<UploadFile> = files.into_iter().take(plan.accepted).collect();
        for file in &files {
            validate_file(&file.file_name, &file.content_type, file.size(), &self.limits)?;
        }

        // The store re-checks the cap on every insert; a concurrent upload may
        // fill the batch after `existing` was counted.
        let mut images = Vec::with_capacity(files.len());
        for file in &files {
            let image_id = Uuid::now_v7();
            let original_url = self.store_original(*identity, batch_id, image_id, file).await?;
            let input = CreateImage {
                id: image_id,
                batch_id,
                original_url,
            };
            match self.rows.create_image(&input, limit).await {
                Ok(Some(image)) => images.push(image),
                Ok(None) => {
                    warn_orphaned(batch_id, image_id, &input.original_url, &"batch is full");
                    break;
                }
                Err(e) => {
                    warn_orphaned(batch_id, image_id, &input.original_url, &e);
                    return Err(e.into());
                }
            }
        }
        if images.is_empty() {
            return Err(EngineError::BatchFull { limit });
        }

        if plan.truncated() {
            tracing::warn!(
                %batch_id,
                requested,
                accepted = plan.accepted,
                skipped = plan.skipped,
                "Upload truncated at batch limit"
            );
        }
        if images.len() < plan.accepted {
            tracing::warn!(
                %batch_id,
                planned = plan.accepted,
                added = images.len(),
                "Batch filled by a concurrent upload"
            );
        }
        tracing::info!(%batch_id, added = images.len(), "Photos added");

        Ok(UploadOutcome {
            skipped: requested - images.len(),
            images,
            requested,
        })
    }

    async fn store_original(
        &self,
        identity: Identity,
        batch_id: DbId,
        image_id: DbId,
        file: &UploadFile,
    ) -> EngineResult<String> {
        let path = original_blob_path(identity.user_id, batch_id, image_id, &file.file_name);
        let url = self
            .blobs
            .put(ORIGINALS_BUCKET, &path, &file.bytes, &file.content_type)
            .await?;
        Ok(url)
    }
}

/// An original was stored but its row was not inserted; nothing references
/// the blob any more.
fn warn_orphaned(
    batch_id: DbId,
    image_id: DbId,
    original_url: &str,
    reason: &dyn std::fmt::Display,
) {
    tracing::warn!(
        %batch_id,
        %image_id,
        original_url,
        error = %reason,
        "Stored original left orphaned"
    );
}
