//! Batch-wide fan-out of a settings diff.
//!
//! Each image gets its own `{override, pending}` write. Writes run
//! concurrently, are never wrapped in a cross-image transaction and are
//! never retried: every write is attempted, and if any fail the first
//! failure (in image order) is surfaced after all of them settle. Pollers
//! may observe a half-propagated batch in the meantime.

use std::sync::Arc;

use batchtone_core::resolution::merge_override;
use batchtone_core::settings::{clamp_or_reject_partial, BoundsPolicy, PartialAdjustmentVector};
use batchtone_core::types::DbId;
use batchtone_db::models::image::Image;
use futures::future::join_all;
use serde::Serialize;

use crate::error::{EngineError, StoreError};
use crate::store::RowStore;
use crate::EngineResult;

/// Outcome of a successful fan-out.
#[derive(Debug, Clone, Serialize)]
pub struct PropagationReport {
    pub batch_id: DbId,
    /// Images written (all of the batch).
    pub updated: usize,
    /// The diff merged into every override.
    pub diff: PartialAdjustmentVector,
}

#[derive(Clone)]
pub struct PropagationCoordinator {
    rows: Arc<dyn RowStore>,
}

impl PropagationCoordinator {
    pub fn new(rows: Arc<dyn RowStore>) -> Self {
        Self { rows }
    }

    /// Merge `diff` into every image override of `batch_id` and re-arm each
    /// image.
    ///
    /// Each override is merged as read at the start of the call; a
    /// concurrent per-image save may be overwritten field by field.
    pub async fn apply_to_all(
        &self,
        batch_id: DbId,
        diff: &PartialAdjustmentVector,
    ) -> EngineResult<PropagationReport> {
        let diff = clamp_or_reject_partial(diff, BoundsPolicy::Reject)?;

        if self.rows.get_batch(batch_id).await?.is_none() {
            return Err(EngineError::not_found("Batch", batch_id));
        }
        let images = self.rows.list_images(batch_id).await?;

        tracing::info!(
            %batch_id,
            images = images.len(),
            fields = diff.len(),
            "Propagating diff to batch"
        );

        let writes = images.iter().map(|image| {
            let id = image.id;
            let merged = merge_override(&image.override_settings, &diff);
            async move { (id, self.rows.write_override(id, &merged).await) }
        });
        let updated = settle(batch_id, join_all(writes).await)?;

        tracing::info!(%batch_id, updated, "Propagation complete");
        Ok(PropagationReport {
            batch_id,
            updated,
            diff,
        })
    }

    /// Re-arm the given images of `batch_id` with the same attempt-all,
    /// first-error semantics as [`apply_to_all`](Self::apply_to_all).
    pub async fn rearm_all(&self, batch_id: DbId, image_ids: &[DbId]) -> EngineResult<usize> {
        let writes = image_ids
            .iter()
            .map(|&id| async move { (id, self.rows.rearm(id).await) });
        settle(batch_id, join_all(writes).await)
    }
}

/// Count successful writes, or fold the failures into
/// [`EngineError::PartialPropagation`] keeping the first.
fn settle(
    batch_id: DbId,
    results: Vec<(DbId, Result<Option<Image>, StoreError>)>,
) -> EngineResult<usize> {
    let attempted = results.len();
    let mut failed = 0;
    let mut first = None;

    for (image_id, result) in results {
        let err = match result {
            Ok(Some(_)) => continue,
            Ok(None) => EngineError::not_found("Image", image_id),
            Err(e) => EngineError::Store(e),
        };
        tracing::warn!(%batch_id, %image_id, error = %err, "Image write failed");
        failed += 1;
        first.get_or_insert(err);
    }

    match first {
        None => Ok(attempted),
        Some(first) => Err(EngineError::PartialPropagation {
            first: Box::new(first),
            failed,
            attempted,
        }),
    }
}
