//! Batch progress as seen by the polling reader.

use serde::Serialize;

use crate::image_status::ImageStatus;

/// Interval at which the results view re-reads a batch.
pub const POLL_INTERVAL_SECS: u64 = 3;

/// Per-status counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub done: usize,
    pub failed: usize,
}

impl BatchProgress {
    /// Tally a batch from its image statuses.
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = ImageStatus>,
    {
        statuses.into_iter().fold(Self::default(), |mut acc, status| {
            acc.total += 1;
            match status {
                ImageStatus::Pending => acc.pending += 1,
                ImageStatus::Processing => acc.processing += 1,
                ImageStatus::Done => acc.done += 1,
                ImageStatus::Failed => acc.failed += 1,
            }
            acc
        })
    }

    /// Done images as a whole percentage (0 for an empty batch).
    pub fn percent_done(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.done as f64 / self.total as f64) * 100.0).round() as u8
    }

    /// Every image has a current edited output.
    pub fn all_done(&self) -> bool {
        self.total > 0 && self.done == self.total
    }
}
