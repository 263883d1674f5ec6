//! Read side for the results view, which re-reads a batch every
//! [`POLL_INTERVAL_SECS`](batchtone_core::progress::POLL_INTERVAL_SECS).

use batchtone_core::image_status::ImageStatus;
use batchtone_core::progress::BatchProgress;
use batchtone_core::settings::{AdjustmentVector, PartialAdjustmentVector};
use batchtone_core::types::{DbId, Timestamp};
use batchtone_db::models::image::Image;
use serde::Serialize;

use crate::{Engine, EngineResult};

/// An image as the results view sees it.
#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub id: DbId,
    pub batch_id: DbId,
    pub original_url: String,
    /// Present only while `status` is `done`.
    pub edited_url: Option<String>,
    pub status: ImageStatus,
    pub override_settings: PartialAdjustmentVector,
    pub effective: AdjustmentVector,
    pub revision: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ImageView {
    pub fn resolve(image: &Image, template: &AdjustmentVector) -> EngineResult<Self> {
        Ok(Self {
            id: image.id,
            batch_id: image.batch_id,
            original_url: image.original_url.clone(),
            edited_url: image.fresh_edited_url().map(str::to_string),
            status: image.status()?,
            override_settings: image.override_settings,
            effective: image.effective(template),
            revision: image.revision,
            created_at: image.created_at,
            updated_at: image.updated_at,
        })
    }
}

impl Engine {
    /// Every image of the batch in upload order, resolved against the
    /// current template.
    pub async fn list_images(&self, batch_id: DbId) -> EngineResult<Vec<ImageView>> {
        let batch = self.get_batch(batch_id).await?;
        let images = self.rows.list_images(batch_id).await?;
        images
            .iter()
            .map(|image| ImageView::resolve(image, &batch.template))
            .collect()
    }

    pub async fn progress(&self, batch_id: DbId) -> EngineResult<BatchProgress> {
        self.get_batch(batch_id).await?;
        let statuses = self
            .rows
            .list_images(batch_id)
            .await?
            .iter()
            .map(Image::status)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BatchProgress::from_statuses(statuses))
    }
}
