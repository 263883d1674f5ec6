//! Batch entity model and DTOs.

use batchtone_core::settings::AdjustmentVector;
use batchtone_core::types::{DbId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `batches` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Batch {
    pub id: DbId,
    pub user_id: UserId,
    /// Baseline every image inherits from; replaced wholesale, never merged.
    #[sqlx(json)]
    pub template: AdjustmentVector,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new batch.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBatch {
    pub id: DbId,
    pub user_id: UserId,
    pub template: AdjustmentVector,
}
