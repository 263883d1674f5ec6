//! Periodic recovery of images a worker claimed and never settled.
//!
//! Images left in `processing` for longer than the configured threshold are
//! re-armed to `pending` so the worker picks them up again.

use std::time::Duration;

use batchtone_engine::Engine;
use tokio_util::sync::CancellationToken;

/// How often the recovery sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Run the recovery loop until `cancel` is triggered. The first sweep runs
/// immediately, which also covers rows left over from before a restart.
pub async fn run(engine: Engine, stuck_after_minutes: i64, cancel: CancellationToken) {
    tracing::info!(
        stuck_after_minutes,
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Stuck image recovery started"
    );

    let stuck_after = chrono::Duration::minutes(stuck_after_minutes);
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Stuck image recovery stopping");
                break;
            }
            _ = interval.tick() => {
                match engine.recover_stuck(stuck_after).await {
                    Ok(0) => tracing::debug!("Stuck image recovery: nothing to re-arm"),
                    Ok(requeued) => tracing::info!(requeued, "Stuck image recovery: re-armed images"),
                    Err(e) => tracing::error!(error = %e, "Stuck image recovery failed"),
                }
            }
        }
    }
}
