//! Upload limits, accepted content types and blob path layout.

use crate::error::CoreError;
use crate::types::{DbId, UserId};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default maximum number of images in one batch.
pub const MAX_IMAGES_PER_BATCH: usize = 25;

/// Default maximum size of one uploaded file, in megabytes.
pub const MAX_FILE_SIZE_MB: u64 = 20;

/// Content types accepted for upload.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Bucket holding untouched uploads.
pub const ORIGINALS_BUCKET: &str = "originals";

/// Extension used when a file name carries none.
pub const DEFAULT_EXTENSION: &str = "jpg";

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Per-batch and per-file upload limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_images_per_batch: usize,
    pub max_file_size_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_images_per_batch: MAX_IMAGES_PER_BATCH,
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
        }
    }
}

/// How many of a requested upload fit in the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPlan {
    pub accepted: usize,
    pub skipped: usize,
}

impl UploadPlan {
    /// True when some files were left out because the batch filled up.
    pub fn truncated(&self) -> bool {
        self.skipped > 0
    }
}

/// Free slots left in a batch that already holds `existing` images.
pub fn remaining_slots(existing: usize, limits: &UploadLimits) -> usize {
    limits.max_images_per_batch.saturating_sub(existing)
}

/// Split `requested` files into the ones that fit and the ones that don't.
pub fn plan_uploads(existing: usize, requested: usize, limits: &UploadLimits) -> UploadPlan {
    let accepted = requested.min(remaining_slots(existing, limits));
    UploadPlan {
        accepted,
        skipped: requested - accepted,
    }
}

/// Validate one file against the accepted types and the size limit.
pub fn validate_file(
    file_name: &str,
    content_type: &str,
    size_bytes: u64,
    limits: &UploadLimits,
) -> Result<(), CoreError> {
    if !ACCEPTED_CONTENT_TYPES.contains(&content_type) {
        return Err(CoreError::Validation(format!(
            "{file_name}: unsupported file type '{content_type}'. Must be one of: {}",
            ACCEPTED_CONTENT_TYPES.join(", ")
        )));
    }
    if size_bytes == 0 {
        return Err(CoreError::Validation(format!("{file_name}: file is empty")));
    }
    if size_bytes > limits.max_file_size_bytes {
        return Err(CoreError::Validation(format!(
            "{file_name}: exceeds {}MB limit",
            limits.max_file_size_bytes / (1024 * 1024)
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Blob paths
// ---------------------------------------------------------------------------

/// Lower-cased extension of `file_name`, or [`DEFAULT_EXTENSION`] when it
/// has none or it is not plain ASCII alphanumerics.
pub fn file_extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// Path of an original inside [`ORIGINALS_BUCKET`]:
/// `{user_id}/{batch_id}/{image_id}.{ext}`.
pub fn original_blob_path(user_id: UserId, batch_id: DbId, image_id: DbId, file_name: &str) -> String {
    format!("{user_id}/{batch_id}/{image_id}.{}", file_extension(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn default_limits() {
        let limits = UploadLimits::default();
        assert_eq!(limits.max_images_per_batch, 25);
        assert_eq!(limits.max_file_size_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn remaining_slots_never_underflows() {
        let limits = UploadLimits::default();
        assert_eq!(remaining_slots(0, &limits), 25);
        assert_eq!(remaining_slots(24, &limits), 1);
        assert_eq!(remaining_slots(30, &limits), 0);
    }

    #[test]
    fn plan_truncates_to_free_slots() {
        let limits = UploadLimits::default();
        let plan = plan_uploads(22, 5, &limits);
        assert_eq!(plan, UploadPlan { accepted: 3, skipped: 2 });
        assert!(plan.truncated());
        assert!(!plan_uploads(0, 5, &limits).truncated());
        assert_eq!(plan_uploads(25, 2, &limits).accepted, 0);
    }

    #[test]
    fn validate_file_accepts_supported_types() {
        let limits = UploadLimits::default();
        for ct in ACCEPTED_CONTENT_TYPES {
            assert!(validate_file("a", ct, 1024, &limits).is_ok());
        }
    }

    #[test]
    fn validate_file_rejects_unsupported_type() {
        let err = validate_file("a.gif", "image/gif", 10, &UploadLimits::default()).unwrap_err();
        assert!(err.to_string().contains("unsupported file type"));
    }

    #[test]
    fn validate_file_rejects_oversized_and_empty() {
        let limits = UploadLimits::default();
        let err = validate_file("big.jpg", "image/jpeg", limits.max_file_size_bytes + 1, &limits)
            .unwrap_err();
        assert!(err.to_string().contains("exceeds 20MB limit"));
        assert!(validate_file("empty.jpg", "image/jpeg", 0, &limits).is_err());
    }

    #[test]
    fn extension_is_lowercased_with_fallback() {
        assert_eq!(file_extension("IMG_001.JPG"), "jpg");
        assert_eq!(file_extension("archive.tar.webp"), "webp");
        assert_eq!(file_extension("photo"), "jpg");
        assert_eq!(file_extension(".hidden"), "jpg");
        assert_eq!(file_extension("trailing."), "jpg");
        assert_eq!(file_extension("a./../b"), "jpg");
    }

    #[test]
    fn original_path_layout() {
        let user = Uuid::nil();
        let batch = Uuid::from_u128(1);
        let image = Uuid::from_u128(2);
        assert_eq!(
            original_blob_path(user, batch, image, "x.png"),
            format!("{user}/{batch}/{image}.png")
        );
    }
}
