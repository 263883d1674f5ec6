//! Image entity model and DTOs.

use batchtone_core::error::CoreError;
use batchtone_core::image_status::{self, ImageStatus};
use batchtone_core::resolution;
use batchtone_core::settings::{AdjustmentVector, PartialAdjustmentVector};
use batchtone_core::types::{DbId, StatusId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Image {
    pub id: DbId,
    pub batch_id: DbId,
    pub original_url: String,
    /// Written only by the worker. Stale unless the status is `done`.
    pub edited_url: Option<String>,
    #[sqlx(json)]
    pub override_settings: PartialAdjustmentVector,
    pub status_id: StatusId,
    /// Incremented on every re-arm.
    pub revision: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Image {
    pub fn status(&self) -> Result<ImageStatus, CoreError> {
        ImageStatus::from_id(self.status_id)
    }

    /// The edited output, only while it reflects the current settings.
    pub fn fresh_edited_url(&self) -> Option<&str> {
        let status = self.status().ok()?;
        image_status::fresh_edited_url(status, self.edited_url.as_deref())
    }

    /// This image's effective vector under `template`.
    pub fn effective(&self, template: &AdjustmentVector) -> AdjustmentVector {
        resolution::effective(template, &self.override_settings)
    }
}

/// DTO for inserting an image. The id is generated before the original is
/// uploaded so the blob path and the row agree.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateImage {
    pub id: DbId,
    pub batch_id: DbId,
    pub original_url: String,
}
