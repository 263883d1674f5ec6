//! [`RowStore`] and [`WorkerStore`] over PostgreSQL.

use async_trait::async_trait;
use batchtone_core::settings::{AdjustmentVector, PartialAdjustmentVector};
use batchtone_core::types::{DbId, Timestamp};
use batchtone_db::models::batch::{Batch, CreateBatch};
use batchtone_db::models::image::{CreateImage, Image};
use batchtone_db::repositories::{BatchRepo, ImageRepo};
use batchtone_db::DbPool;

use super::{RowStore, WorkerStore};
use crate::error::StoreError;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl RowStore for PgStore {
    async fn create_batch(&self, input: &CreateBatch) -> Result<Batch, StoreError> {
        Ok(BatchRepo::create(&self.pool, input).await?)
    }

    async fn get_batch(&self, id: DbId) -> Result<Option<Batch>, StoreError> {
        Ok(BatchRepo::find_by_id(&self.pool, id).await?)
    }

    async fn replace_template(
        &self,
        id: DbId,
        template: &AdjustmentVector,
    ) -> Result<Option<Batch>, StoreError> {
        Ok(BatchRepo::replace_template(&self.pool, id, template).await?)
    }

    async fn create_image(
        &self,
        input: &CreateImage,
        max_per_batch: usize,
    ) -> Result<Option<Image>, StoreError> {
        let max = i64::try_from(max_per_batch).unwrap_or(i64::MAX);
        Ok(ImageRepo::create_within_limit(&self.pool, input, max).await?)
    }

    async fn get_image(&self, id: DbId) -> Result<Option<Image>, StoreError> {
        Ok(ImageRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_images(&self, batch_id: DbId) -> Result<Vec<Image>, StoreError> {
        Ok(ImageRepo::list_by_batch(&self.pool, batch_id).await?)
    }

    async fn count_images(&self, batch_id: DbId) -> Result<usize, StoreError> {
        let count = ImageRepo::count_by_batch(&self.pool, batch_id).await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn write_override(
        &self,
        id: DbId,
        override_settings: &PartialAdjustmentVector,
    ) -> Result<Option<Image>, StoreError> {
        Ok(ImageRepo::write_override(&self.pool, id, override_settings).await?)
    }

    async fn rearm(&self, id: DbId) -> Result<Option<Image>, StoreError> {
        Ok(ImageRepo::rearm(&self.pool, id).await?)
    }

    async fn requeue_stale_processing(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        Ok(ImageRepo::requeue_stale_processing(&self.pool, cutoff).await?)
    }
}

#[async_trait]
impl WorkerStore for PgStore {
    async fn list_pending(&self, limit: usize) -> Result<Vec<Image>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(ImageRepo::list_pending(&self.pool, limit).await?)
    }

    async fn claim(&self, id: DbId, revision: i64) -> Result<bool, StoreError> {
        Ok(ImageRepo::claim(&self.pool, id, revision).await?)
    }

    async fn complete(&self, id: DbId, revision: i64, edited_url: &str) -> Result<bool, StoreError> {
        Ok(ImageRepo::complete(&self.pool, id, revision, edited_url).await?)
    }

    async fn fail(&self, id: DbId, revision: i64) -> Result<bool, StoreError> {
        Ok(ImageRepo::fail(&self.pool, id, revision).await?)
    }
}
