//! Change-notification wrapper around a [`RowStore`].
//!
//! Status observation stays pull-based (`list_images`); this wrapper only
//! lets in-process listeners learn that a batch changed without polling.
//! Events are published on a `tokio::sync::broadcast` channel after the
//! underlying write succeeds.

use std::sync::Arc;

use async_trait::async_trait;
use batchtone_core::image_status::ImageStatus;
use batchtone_core::settings::{AdjustmentVector, PartialAdjustmentVector};
use batchtone_core::types::{DbId, Timestamp};
use batchtone_db::models::batch::{Batch, CreateBatch};
use batchtone_db::models::image::{CreateImage, Image};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

use super::RowStore;
use crate::error::StoreError;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    BatchCreated,
    TemplateReplaced,
    ImageCreated,
    ImageRearmed,
    StaleRequeued,
}

/// One committed row write.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// `None` only for [`ChangeKind::StaleRequeued`], which spans batches.
    pub batch_id: Option<DbId>,
    pub image_id: Option<DbId>,
    pub status: Option<ImageStatus>,
    pub revision: Option<i64>,
    pub timestamp: Timestamp,
}

impl ChangeEvent {
    fn batch(kind: ChangeKind, batch: &Batch) -> Self {
        Self {
            kind,
            batch_id: Some(batch.id),
            image_id: None,
            status: None,
            revision: None,
            timestamp: Utc::now(),
        }
    }

    fn image(kind: ChangeKind, image: &Image) -> Self {
        Self {
            kind,
            batch_id: Some(image.batch_id),
            image_id: Some(image.id),
            status: image.status().ok(),
            revision: Some(image.revision),
            timestamp: Utc::now(),
        }
    }
}

pub struct NotifyingStore {
    inner: Arc<dyn RowStore>,
    sender: broadcast::Sender<ChangeEvent>,
}

impl NotifyingStore {
    pub fn new(inner: Arc<dyn RowStore>) -> Self {
        Self::with_capacity(inner, DEFAULT_CAPACITY)
    }

    /// When the buffer is full the oldest events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn with_capacity(inner: Arc<dyn RowStore>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { inner, sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    fn publish(&self, event: ChangeEvent) {
        // A send error only means nobody is listening.
        let _ = self.sender.send(event);
    }
}

#[async_trait]
impl RowStore for NotifyingStore {
    async fn create_batch(&self, input: &CreateBatch) -> Result<Batch, StoreError> {
        let batch = self.inner.create_batch(input).await?;
        self.publish(ChangeEvent::batch(ChangeKind::BatchCreated, &batch));
        Ok(batch)
    }

    async fn get_batch(&self, id: DbId) -> Result<Option<Batch>, StoreError> {
        self.inner.get_batch(id).await
    }

    async fn replace_template(
        &self,
        id: DbId,
        template: &AdjustmentVector,
    ) -> Result<Option<Batch>, StoreError> {
        let batch = self.inner.replace_template(id, template).await?;
        if let Some(batch) = &batch {
            self.publish(ChangeEvent::batch(ChangeKind::TemplateReplaced, batch));
        }
        Ok(batch)
    }

    async fn create_image(
        &self,
        input: &CreateImage,
        max_per_batch: usize,
    ) -> Result<Option<Image>, StoreError> {
        let image = self.inner.create_image(input, max_per_batch).await?;
        if let Some(image) = &image {
            self.publish(ChangeEvent::image(ChangeKind::ImageCreated, image));
        }
        Ok(image)
    }

    async fn get_image(&self, id: DbId) -> Result<Option<Image>, StoreError> {
        self.inner.get_image(id).await
    }

    async fn list_images(&self, batch_id: DbId) -> Result<Vec<Image>, StoreError> {
        self.inner.list_images(batch_id).await
    }

    async fn count_images(&self, batch_id: DbId) -> Result<usize, StoreError> {
        self.inner.count_images(batch_id).await
    }

    async fn write_override(
        &self,
        id: DbId,
        override_settings: &PartialAdjustmentVector,
    ) -> Result<Option<Image>, StoreError> {
        let image = self.inner.write_override(id, override_settings).await?;
        if let Some(image) = &image {
            self.publish(ChangeEvent::image(ChangeKind::ImageRearmed, image));
        }
        Ok(image)
    }

    async fn rearm(&self, id: DbId) -> Result<Option<Image>, StoreError> {
        let image = self.inner.rearm(id).await?;
        if let Some(image) = &image {
            self.publish(ChangeEvent::image(ChangeKind::ImageRearmed, image));
        }
        Ok(image)
    }

    async fn requeue_stale_processing(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        let requeued = self.inner.requeue_stale_processing(cutoff).await?;
        if requeued > 0 {
            self.publish(ChangeEvent {
                kind: ChangeKind::StaleRequeued,
                batch_id: None,
                image_id: None,
                status: Some(ImageStatus::Pending),
                revision: None,
                timestamp: Utc::now(),
            });
        }
        Ok(requeued)
    }
}
