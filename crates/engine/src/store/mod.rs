//! Row store contracts and their implementations.
//!
//! [`RowStore`] is what the engine needs: select/insert/update by key or by
//! `batch_id`, with no multi-row transactions. [`WorkerStore`] is the
//! narrower contract handed to the external image-processing worker; its
//! writes are fenced on the image `revision` so output computed from
//! superseded settings is dropped.

use async_trait::async_trait;
use batchtone_core::settings::{AdjustmentVector, PartialAdjustmentVector};
use batchtone_core::types::{DbId, Timestamp};
use batchtone_db::models::batch::{Batch, CreateBatch};
use batchtone_db::models::image::{CreateImage, Image};

use crate::error::StoreError;

pub mod memory;
pub mod notify;
pub mod postgres;

pub use memory::MemoryStore;
pub use notify::{ChangeEvent, ChangeKind, NotifyingStore};
pub use postgres::PgStore;

#[async_trait]
pub trait RowStore: Send + Sync {
    async fn create_batch(&self, input: &CreateBatch) -> Result<Batch, StoreError>;

    async fn get_batch(&self, id: DbId) -> Result<Option<Batch>, StoreError>;

    /// Replace the template wholesale. `None` if the batch does not exist.
    async fn replace_template(
        &self,
        id: DbId,
        template: &AdjustmentVector,
    ) -> Result<Option<Batch>, StoreError>;

    /// Insert a `pending` image unless the batch already holds
    /// `max_per_batch` images, in which case nothing is written and `None`
    /// is returned. The count and the insert are atomic per batch.
    async fn create_image(
        &self,
        input: &CreateImage,
        max_per_batch: usize,
    ) -> Result<Option<Image>, StoreError>;

    async fn get_image(&self, id: DbId) -> Result<Option<Image>, StoreError>;

    /// Every image of a batch in upload order.
    async fn list_images(&self, batch_id: DbId) -> Result<Vec<Image>, StoreError>;

    async fn count_images(&self, batch_id: DbId) -> Result<usize, StoreError>;

    /// Store `{override, pending}` in one row write and bump the revision.
    async fn write_override(
        &self,
        id: DbId,
        override_settings: &PartialAdjustmentVector,
    ) -> Result<Option<Image>, StoreError>;

    /// Set `pending` and bump the revision, keeping the override.
    async fn rearm(&self, id: DbId) -> Result<Option<Image>, StoreError>;

    /// Re-arm rows left in `processing` since before `cutoff`.
    async fn requeue_stale_processing(&self, cutoff: Timestamp) -> Result<u64, StoreError>;
}

/// Contract for the external worker. Every method returning `bool` reports
/// whether the write was applied; `false` means the row moved on (re-armed
/// or already claimed) and the caller's work is stale.
#[async_trait]
pub trait WorkerStore: Send + Sync {
    async fn list_pending(&self, limit: usize) -> Result<Vec<Image>, StoreError>;

    async fn claim(&self, id: DbId, revision: i64) -> Result<bool, StoreError>;

    async fn complete(&self, id: DbId, revision: i64, edited_url: &str) -> Result<bool, StoreError>;

    async fn fail(&self, id: DbId, revision: i64) -> Result<bool, StoreError>;
}
