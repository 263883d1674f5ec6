//! Repository for the `images` table.
//!
//! Engine-side writes (`write_override`, `rearm`, `requeue_stale_processing`)
//! always land on `pending` and bump `revision`. Worker-side writes
//! (`claim`, `complete`, `fail`) are fenced on the revision the worker read,
//! so output computed from superseded settings is dropped.

use batchtone_core::image_status::ImageStatus;
use batchtone_core::settings::PartialAdjustmentVector;
use batchtone_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::image::{CreateImage, Image};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, batch_id, original_url, edited_url, override_settings, \
                       status_id, revision, created_at, updated_at";

/// Provides CRUD and status operations for images.
pub struct ImageRepo;

impl ImageRepo {
    /// Insert a new image with an empty override in `pending`, unless the
    /// batch already holds `max_per_batch` images.
    ///
    /// The batch row is locked for the count and the insert, so concurrent
    /// uploads to one batch cannot overshoot the cap. Returns `None` when the
    /// batch is full and `RowNotFound` when it does not exist.
    pub async fn create_within_limit(
        pool: &PgPool,
        input: &CreateImage,
        max_per_batch: i64,
    ) -> Result<Option<Image>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query_scalar::<_, DbId>("SELECT id FROM batches WHERE id = $1 FOR UPDATE")
            .bind(input.batch_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let existing =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM images WHERE batch_id = $1")
                .bind(input.batch_id)
                .fetch_one(&mut *tx)
                .await?;
        if existing >= max_per_batch {
            tracing::debug!(batch_id = %input.batch_id, existing, max_per_batch, "Batch full, image not inserted");
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO images (id, batch_id, original_url, status_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let image = sqlx::query_as::<_, Image>(&query)
            .bind(input.id)
            .bind(input.batch_id)
            .bind(&input.original_url)
            .bind(ImageStatus::Pending.id())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(image))
    }

    /// Find an image by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Image>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM images WHERE id = $1");
        sqlx::query_as::<_, Image>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every image of a batch in upload order.
    pub async fn list_by_batch(pool: &PgPool, batch_id: DbId) -> Result<Vec<Image>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM images
             WHERE batch_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Image>(&query)
            .bind(batch_id)
            .fetch_all(pool)
            .await
    }

    /// Count the images of a batch.
    pub async fn count_by_batch(pool: &PgPool, batch_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM images WHERE batch_id = $1")
            .bind(batch_id)
            .fetch_one(pool)
            .await
    }

    /// Store a new override and re-arm the image.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn write_override(
        pool: &PgPool,
        id: DbId,
        override_settings: &PartialAdjustmentVector,
    ) -> Result<Option<Image>, sqlx::Error> {
        let query = format!(
            "UPDATE images SET
                override_settings = $2,
                status_id = $3,
                revision = revision + 1,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Image>(&query)
            .bind(id)
            .bind(Json(override_settings))
            .bind(ImageStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Re-arm an image without touching its override.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn rearm(pool: &PgPool, id: DbId) -> Result<Option<Image>, sqlx::Error> {
        let query = format!(
            "UPDATE images SET
                status_id = $2,
                revision = revision + 1,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Image>(&query)
            .bind(id)
            .bind(ImageStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Re-arm rows stuck in `processing` since before `cutoff`.
    ///
    /// Returns the number of rows re-armed.
    pub async fn requeue_stale_processing(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE images SET
                status_id = $1,
                revision = revision + 1,
                updated_at = NOW()
             WHERE status_id = $2 AND updated_at < $3",
        )
        .bind(ImageStatus::Pending.id())
        .bind(ImageStatus::Processing.id())
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Pending images, oldest first, for the worker to pick up.
    pub async fn list_pending(pool: &PgPool, limit: i64) -> Result<Vec<Image>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM images
             WHERE status_id = $1
             ORDER BY updated_at ASC
             LIMIT $2"
        );
        sqlx::query_as::<_, Image>(&query)
            .bind(ImageStatus::Pending.id())
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Worker claim: `pending -> processing` at `revision`.
    ///
    /// Returns `false` if the image was re-armed or claimed since it was read.
    pub async fn claim(pool: &PgPool, id: DbId, revision: i64) -> Result<bool, sqlx::Error> {
        Self::fenced_transition(pool, id, revision, ImageStatus::Pending, ImageStatus::Processing, None)
            .await
    }

    /// Worker success: `processing -> done` with the output URL.
    ///
    /// Returns `false` (and stores nothing) if the image was re-armed since
    /// the claim.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        revision: i64,
        edited_url: &str,
    ) -> Result<bool, sqlx::Error> {
        Self::fenced_transition(
            pool,
            id,
            revision,
            ImageStatus::Processing,
            ImageStatus::Done,
            Some(edited_url),
        )
        .await
    }

    /// Worker failure: `processing -> failed`.
    pub async fn fail(pool: &PgPool, id: DbId, revision: i64) -> Result<bool, sqlx::Error> {
        Self::fenced_transition(pool, id, revision, ImageStatus::Processing, ImageStatus::Failed, None)
            .await
    }

    async fn fenced_transition(
        pool: &PgPool,
        id: DbId,
        revision: i64,
        from: ImageStatus,
        to: ImageStatus,
        edited_url: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE images SET
                status_id = $4,
                edited_url = COALESCE($5, edited_url),
                updated_at = NOW()
             WHERE id = $1 AND revision = $2 AND status_id = $3",
        )
        .bind(id)
        .bind(revision)
        .bind(from.id())
        .bind(to.id())
        .bind(edited_url)
        .execute(pool)
        .await?;

        let applied = result.rows_affected() > 0;
        if !applied {
            tracing::debug!(image_id = %id, revision, from = %from, to = %to, "Fenced worker write dropped");
        }
        Ok(applied)
    }
}
