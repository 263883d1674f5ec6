//! Recovery of images a worker claimed and never settled.

use chrono::{Duration, Utc};

use crate::{Engine, EngineResult};

/// Rows in `processing` for longer than this are assumed abandoned.
pub const DEFAULT_STUCK_AFTER_MINUTES: i64 = 10;

impl Engine {
    /// Re-arm images stuck in `processing` for longer than `stuck_after`.
    ///
    /// Re-arming bumps the revision, so a slow worker that eventually
    /// reports back on the old claim is fenced out.
    pub async fn recover_stuck(&self, stuck_after: Duration) -> EngineResult<u64> {
        let cutoff = Utc::now() - stuck_after;
        let requeued = self.rows.requeue_stale_processing(cutoff).await?;
        if requeued > 0 {
            tracing::info!(requeued, "Re-armed images stuck in processing");
        }
        Ok(requeued)
    }
}
