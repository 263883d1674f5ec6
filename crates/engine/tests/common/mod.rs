#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use batchtone_core::error::CoreError;
use batchtone_core::settings::{AdjustmentVector, PartialAdjustmentVector};
use batchtone_core::types::{DbId, Timestamp};
use batchtone_core::upload::UploadLimits;
use batchtone_db::models::batch::{Batch, CreateBatch};
use batchtone_db::models::image::{CreateImage, Image};
use batchtone_engine::blob::MemoryBlobStore;
use batchtone_engine::identity::{Identity, IdentityProvider, Session};
use batchtone_engine::store::{MemoryStore, RowStore};
use batchtone_engine::uploads::{FirstUpload, UploadFile};
use batchtone_engine::{Engine, StoreError};
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Tokens are the user id itself.
pub struct PlainIdentity;

impl IdentityProvider for PlainIdentity {
    fn current_user(&self, token: &str) -> Result<Identity, CoreError> {
        token
            .parse()
            .map(|user_id| Identity { user_id })
            .map_err(|_| CoreError::Unauthorized("bad token".into()))
    }

    fn create_anonymous_session(&self) -> Result<Session, CoreError> {
        let user_id = Uuid::now_v7();
        Ok(Session {
            token: user_id.to_string(),
            user_id,
            expires_at: Utc::now() + chrono::Duration::days(30),
        })
    }
}

// ---------------------------------------------------------------------------
// Failure injection
// ---------------------------------------------------------------------------

/// Delegates to a [`MemoryStore`] but fails per-image writes for the images
/// marked with [`fail_writes_for`](Self::fail_writes_for).
pub struct FailingStore {
    inner: Arc<MemoryStore>,
    failing: RwLock<HashSet<DbId>>,
}

impl FailingStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            failing: RwLock::new(HashSet::new()),
        }
    }

    pub async fn fail_writes_for(&self, id: DbId) {
        self.failing.write().await.insert(id);
    }

    async fn check(&self, id: DbId) -> Result<(), StoreError> {
        if self.failing.read().await.contains(&id) {
            return Err(StoreError::Unavailable(format!("injected failure for {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RowStore for FailingStore {
    async fn create_batch(&self, input: &CreateBatch) -> Result<Batch, StoreError> {
        self.inner.create_batch(input).await
    }

    async fn get_batch(&self, id: DbId) -> Result<Option<Batch>, StoreError> {
        self.inner.get_batch(id).await
    }

    async fn replace_template(
        &self,
        id: DbId,
        template: &AdjustmentVector,
    ) -> Result<Option<Batch>, StoreError> {
        self.inner.replace_template(id, template).await
    }

    async fn create_image(
        &self,
        input: &CreateImage,
        max_per_batch: usize,
    ) -> Result<Option<Image>, StoreError> {
        self.inner.create_image(input, max_per_batch).await
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
        self.check(id).await?;
        self.inner.write_override(id, override_settings).await
    }

    async fn rearm(&self, id: DbId) -> Result<Option<Image>, StoreError> {
        self.check(id).await?;
        self.inner.rearm(id).await
    }

    async fn requeue_stale_processing(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        self.inner.requeue_stale_processing(cutoff).await
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub struct TestEngine {
    pub engine: Engine,
    pub rows: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
}

pub fn test_engine() -> TestEngine {
    test_engine_with_limits(UploadLimits::default())
}

pub fn test_engine_with_limits(limits: UploadLimits) -> TestEngine {
    let rows = Arc::new(MemoryStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let engine = Engine::new(rows.clone(), blobs.clone(), Arc::new(PlainIdentity), limits);
    TestEngine { engine, rows, blobs }
}

/// Engine over a [`FailingStore`]; the returned [`MemoryStore`] is the one
/// underneath, for seeding and inspection.
pub fn failing_engine() -> (Engine, Arc<FailingStore>, Arc<MemoryStore>) {
    let rows = Arc::new(MemoryStore::new());
    let failing = Arc::new(FailingStore::new(rows.clone()));
    let engine = Engine::new(
        failing.clone(),
        Arc::new(MemoryBlobStore::new()),
        Arc::new(PlainIdentity),
        UploadLimits::default(),
    );
    (engine, failing, rows)
}

pub fn jpeg(name: &str) -> UploadFile {
    UploadFile {
        file_name: name.to_string(),
        content_type: "image/jpeg".to_string(),
        bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
    }
}

/// A batch with `n` images, created by an anonymous first upload followed
/// by one add. Images are returned in upload order.
pub async fn seed_batch(engine: &Engine, n: usize) -> (Identity, FirstUpload, Vec<Image>) {
    assert!(n >= 1);
    let first = engine.start_batch(None, jpeg("photo_0.jpg")).await.unwrap();
    let identity = first.session.as_ref().unwrap().identity();

    let mut images = vec![first.image.clone()];
    if n > 1 {
        let files = (1..n).map(|i| jpeg(&format!("photo_{i}.jpg"))).collect();
        let outcome = engine.add_photos(&identity, first.batch.id, files).await.unwrap();
        images.extend(outcome.images);
    }
    (identity, first, images)
}
