use batchtone_core::error::CoreError;

/// Failure of the row store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Row store unavailable: {0}")]
    Unavailable(String),
}

/// Failure of the blob store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage rejected the upload: {0}")]
    Rejected(String),
}

/// Error surfaced by every engine operation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Some per-image writes of a fan-out failed. Every write was attempted;
    /// `first` is the first failure in image order.
    #[error("{failed} of {attempted} image writes failed; first error: {first}")]
    PartialPropagation {
        #[source]
        first: Box<EngineError>,
        failed: usize,
        attempted: usize,
    },

    #[error("Batch is full ({limit} images max)")]
    BatchFull { limit: usize },
}

impl EngineError {
    pub(crate) fn not_found(entity: &'static str, id: batchtone_core::types::DbId) -> Self {
        Self::Core(CoreError::NotFound { entity, id })
    }
}
