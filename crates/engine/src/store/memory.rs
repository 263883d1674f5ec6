//! In-process row store.
//!
//! Used when no `DATABASE_URL` is configured and by every test. Rows live in
//! `HashMap`s behind a `tokio::sync::RwLock`; each method takes the lock for
//! one row (or one batch listing), matching the per-row atomicity of the
//! PostgreSQL store.

use std::collections::HashMap;

use async_trait::async_trait;
use batchtone_core::image_status::{validate_transition, Actor, ImageStatus};
use batchtone_core::settings::{AdjustmentVector, PartialAdjustmentVector};
use batchtone_core::types::{DbId, Timestamp};
use batchtone_db::models::batch::{Batch, CreateBatch};
use batchtone_db::models::image::{CreateImage, Image};
use chrono::Utc;
use tokio::sync::RwLock;

use super::{RowStore, WorkerStore};
use crate::error::StoreError;

struct StoredImage {
    /// Insertion order; ties on `created_at` are broken by it.
    seq: u64,
    row: Image,
}

#[derive(Default)]
struct State {
    batches: HashMap<DbId, Batch>,
    images: HashMap<DbId, StoredImage>,
    next_seq: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared worker-side transition, fenced on `revision`.
    async fn worker_transition(
        &self,
        id: DbId,
        revision: i64,
        to: ImageStatus,
        edited_url: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let Some(stored) = state.images.get_mut(&id) else {
            return Ok(false);
        };
        let row = &mut stored.row;
        if row.revision != revision {
            tracing::debug!(image_id = %id, revision, current = row.revision, "Fenced worker write dropped");
            return Ok(false);
        }
        let Ok(from) = ImageStatus::from_id(row.status_id) else {
            return Ok(false);
        };
        if validate_transition(from, to, Actor::Worker).is_err() {
            return Ok(false);
        }
        row.status_id = to.id();
        if let Some(url) = edited_url {
            row.edited_url = Some(url.to_string());
        }
        row.updated_at = Utc::now();
        Ok(true)
    }
}

fn rearm_row(row: &mut Image) {
    row.status_id = ImageStatus::Pending.id();
    row.revision += 1;
    row.updated_at = Utc::now();
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn create_batch(&self, input: &CreateBatch) -> Result<Batch, StoreError> {
        let mut state = self.state.write().await;
        if state.batches.contains_key(&input.id) {
            return Err(StoreError::Unavailable(format!("batch {} already exists", input.id)));
        }
        let now = Utc::now();
        let batch = Batch {
            id: input.id,
            user_id: input.user_id,
            template: input.template,
            created_at: now,
            updated_at: now,
        };
        state.batches.insert(batch.id, batch.clone());
        Ok(batch)
    }

    async fn get_batch(&self, id: DbId) -> Result<Option<Batch>, StoreError> {
        Ok(self.state.read().await.batches.get(&id).cloned())
    }

    async fn replace_template(
        &self,
        id: DbId,
        template: &AdjustmentVector,
    ) -> Result<Option<Batch>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.batches.get_mut(&id).map(|batch| {
            batch.template = *template;
            batch.updated_at = Utc::now();
            batch.clone()
        }))
    }

    async fn create_image(
        &self,
        input: &CreateImage,
        max_per_batch: usize,
    ) -> Result<Option<Image>, StoreError> {
        let mut state = self.state.write().await;
        if !state.batches.contains_key(&input.batch_id) {
            return Err(StoreError::Unavailable(format!(
                "batch {} does not exist",
                input.batch_id
            )));
        }
        if state.images.contains_key(&input.id) {
            return Err(StoreError::Unavailable(format!("image {} already exists", input.id)));
        }
        let existing = state
            .images
            .values()
            .filter(|s| s.row.batch_id == input.batch_id)
            .count();
        if existing >= max_per_batch {
            return Ok(None);
        }
        let now = Utc::now();
        let image = Image {
            id: input.id,
            batch_id: input.batch_id,
            original_url: input.original_url.clone(),
            edited_url: None,
            override_settings: PartialAdjustmentVector::empty(),
            status_id: ImageStatus::Pending.id(),
            revision: 0,
            created_at: now,
            updated_at: now,
        };
        let seq = state.next_seq;
        state.next_seq += 1;
        state.images.insert(image.id, StoredImage { seq, row: image.clone() });
        Ok(Some(image))
    }

    async fn get_image(&self, id: DbId) -> Result<Option<Image>, StoreError> {
        Ok(self.state.read().await.images.get(&id).map(|s| s.row.clone()))
    }

    async fn list_images(&self, batch_id: DbId) -> Result<Vec<Image>, StoreError> {
        let state = self.state.read().await;
        let mut rows: Vec<&StoredImage> = state
            .images
            .values()
            .filter(|s| s.row.batch_id == batch_id)
            .collect();
        rows.sort_by_key(|s| (s.row.created_at, s.seq));
        Ok(rows.into_iter().map(|s| s.row.clone()).collect())
    }

    async fn count_images(&self, batch_id: DbId) -> Result<usize, StoreError> {
        let state = self.state.read().await;
        Ok(state.images.values().filter(|s| s.row.batch_id == batch_id).count())
    }

    async fn write_override(
        &self,
        id: DbId,
        override_settings: &PartialAdjustmentVector,
    ) -> Result<Option<Image>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.images.get_mut(&id).map(|stored| {
            stored.row.override_settings = *override_settings;
            rearm_row(&mut stored.row);
            stored.row.clone()
        }))
    }

    async fn rearm(&self, id: DbId) -> Result<Option<Image>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.images.get_mut(&id).map(|stored| {
            rearm_row(&mut stored.row);
            stored.row.clone()
        }))
    }

    async fn requeue_stale_processing(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let mut requeued = 0;
        for stored in state.images.values_mut() {
            let row = &mut stored.row;
            if row.status_id == ImageStatus::Processing.id() && row.updated_at < cutoff {
                rearm_row(row);
                requeued += 1;
            }
        }
        Ok(requeued)
    }
}

#[async_trait]
impl WorkerStore for MemoryStore {
    async fn list_pending(&self, limit: usize) -> Result<Vec<Image>, StoreError> {
        let state = self.state.read().await;
        let mut rows: Vec<&Image> = state
            .images
            .values()
            .map(|s| &s.row)
            .filter(|row| row.status_id == ImageStatus::Pending.id())
            .collect();
        rows.sort_by_key(|row| row.updated_at);
        Ok(rows.into_iter().take(limit).cloned().collect())
    }

    async fn claim(&self, id: DbId, revision: i64) -> Result<bool, StoreError> {
        self.worker_transition(id, revision, ImageStatus::Processing, None).await
    }

    async fn complete(&self, id: DbId, revision: i64, edited_url: &str) -> Result<bool, StoreError> {
        self.worker_transition(id, revision, ImageStatus::Done, Some(edited_url))
            .await
    }

    async fn fail(&self, id: DbId, revision: i64) -> Result<bool, StoreError> {
        self.worker_transition(id, revision, ImageStatus::Failed, None).await
    }
}
