//! Repository for the `batches` table.

use batchtone_core::settings::AdjustmentVector;
use batchtone_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::batch::{Batch, CreateBatch};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, template, created_at, updated_at";

/// Provides CRUD operations for batches.
pub struct BatchRepo;

impl BatchRepo {
    /// Insert a new batch, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateBatch) -> Result<Batch, sqlx::Error> {
        let query = format!(
            "INSERT INTO batches (id, user_id, template)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(input.id)
            .bind(input.user_id)
            .bind(Json(&input.template))
            .fetch_one(pool)
            .await
    }

    /// Find a batch by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM batches WHERE id = $1");
        sqlx::query_as::<_, Batch>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Replace the whole template. Last write wins; no per-field merge.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn replace_template(
        pool: &PgPool,
        id: DbId,
        template: &AdjustmentVector,
    ) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!(
            "UPDATE batches SET template = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(id)
            .bind(Json(template))
            .fetch_optional(pool)
            .await
    }
}
