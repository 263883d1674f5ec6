//! Settings resolution and propagation engine.
//!
//! [`Engine`] ties the pure rules in `batchtone_core` to the external
//! collaborators: a row store ([`store::RowStore`]), a blob store
//! ([`blob::BlobStore`]) and an identity provider
//! ([`identity::IdentityProvider`]). Every collaborator is a trait object so
//! the same engine runs against PostgreSQL in production and the in-memory
//! stores in tests.
//!
//! The engine never sets `processing`, `done` or `failed`; those belong to
//! the external worker through [`store::WorkerStore`].

use std::sync::Arc;

use batchtone_core::types::DbId;
use batchtone_core::upload::UploadLimits;
use batchtone_db::models::batch::Batch;
use batchtone_db::models::image::Image;

pub mod blob;
pub mod editing;
pub mod error;
pub mod identity;
pub mod polling;
pub mod propagation;
pub mod recovery;
pub mod store;
pub mod uploads;

pub use error::{EngineError, StorageError, StoreError};
pub use propagation::{PropagationCoordinator, PropagationReport};

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;

/// Entry point for every engine operation.
///
/// Cheap to clone; all collaborators sit behind `Arc`.
#[derive(Clone)]
pub struct Engine {
    rows: Arc<dyn store::RowStore>,
    blobs: Arc<dyn blob::BlobStore>,
    identity: Arc<dyn identity::IdentityProvider>,
    coordinator: PropagationCoordinator,
    limits: UploadLimits,
}

impl Engine {
    pub fn new(
        rows: Arc<dyn store::RowStore>,
        blobs: Arc<dyn blob::BlobStore>,
        identity: Arc<dyn identity::IdentityProvider>,
        limits: UploadLimits,
    ) -> Self {
        let coordinator = PropagationCoordinator::new(Arc::clone(&rows));
        Self {
            rows,
            blobs,
            identity,
            coordinator,
            limits,
        }
    }

    pub fn identity(&self) -> &dyn identity::IdentityProvider {
        self.identity.as_ref()
    }

    pub fn coordinator(&self) -> &PropagationCoordinator {
        &self.coordinator
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    pub async fn get_batch(&self, id: DbId) -> EngineResult<Batch> {
        self.rows
            .get_batch(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Batch", id))
    }

    pub(crate) async fn load_image(&self, id: DbId) -> EngineResult<Image> {
        self.rows
            .get_image(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Image", id))
    }
}
