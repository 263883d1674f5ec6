//! Structured log of committed row-store writes.
//!
//! Subscribes to the [`NotifyingStore`](batchtone_engine::store::NotifyingStore)
//! broadcast channel and emits one debug event per change. Exits when the
//! channel closes or `cancel` is triggered.

use batchtone_engine::store::ChangeEvent;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

pub async fn run(mut receiver: broadcast::Receiver<ChangeEvent>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            received = receiver.recv() => match received {
                Ok(event) => {
                    tracing::debug!(
                        kind = ?event.kind,
                        batch_id = ?event.batch_id,
                        image_id = ?event.image_id,
                        status = ?event.status,
                        revision = ?event.revision,
                        "Row store change"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Change log lagged, some changes were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Change channel closed, change log shutting down");
                    break;
                }
            }
        }
    }
}
