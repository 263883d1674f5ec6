//! Edit sessions and the three ways an edit is committed.
//!
//! A session records the vector the editor started from (its baseline).
//! On commit the engine diffs the edited vector against that baseline, so
//! only fields the user actually moved are written into overrides.
//!
//! | commit                  | template            | overrides                    |
//! |-------------------------|---------------------|------------------------------|
//! | finalize template edit  | replaced wholesale  | untouched                    |
//! | save for this photo     | untouched           | diff merged into one image   |
//! | apply adjusted to all   | replaced wholesale  | diff merged into every image |

use batchtone_core::error::CoreError;
use batchtone_core::resolution::{diff, merge_override};
use batchtone_core::settings::{clamp_or_reject, AdjustmentVector, BoundsPolicy};
use batchtone_core::transform::{map_to_transform, Transform};
use batchtone_core::types::DbId;
use batchtone_db::models::batch::Batch;
use batchtone_db::models::image::Image;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::{Engine, EngineResult, PropagationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    /// Editing the batch template on its template photo.
    Template,
    /// Adjusting one photo on top of the template.
    Adjust,
}

/// Rendered preview of a vector.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub transform: Transform,
    /// CSS `filter` value.
    pub filter: String,
    /// CSS colour of the tint layer.
    pub overlay: String,
}

impl Preview {
    pub fn of(vector: &AdjustmentVector) -> Self {
        let transform = map_to_transform(vector);
        Self {
            filter: transform.filter_string(),
            overlay: transform.overlay.css(),
            transform,
        }
    }
}

/// Starting point of an editor.
#[derive(Debug, Clone, Serialize)]
pub struct EditSession {
    pub mode: EditMode,
    pub batch_id: DbId,
    pub image_id: DbId,
    pub original_url: String,
    /// Vector the editor opens with; later diffs are taken against it.
    pub baseline: AdjustmentVector,
    pub preview: Preview,
}

/// Result of finalizing a template edit.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateUpdate {
    pub batch: Batch,
    /// Images re-armed because their effective vector changed (always
    /// including the template photo).
    pub rearmed: usize,
}

fn validated(vector: &AdjustmentVector) -> Result<AdjustmentVector, CoreError> {
    clamp_or_reject(vector, BoundsPolicy::Reject)
}

fn ensure_in_batch(image: &Image, batch_id: DbId) -> Result<(), CoreError> {
    if image.batch_id == batch_id {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Image {} does not belong to batch {batch_id}",
            image.id
        )))
    }
}

impl Engine {
    /// Open the template editor: the baseline is the batch template.
    pub async fn open_template_session(
        &self,
        batch_id: DbId,
        image_id: DbId,
    ) -> EngineResult<EditSession> {
        let batch = self.get_batch(batch_id).await?;
        let image = self.load_image(image_id).await?;
        ensure_in_batch(&image, batch_id)?;

        Ok(EditSession {
            mode: EditMode::Template,
            batch_id,
            image_id,
            original_url: image.original_url,
            baseline: batch.template,
            preview: Preview::of(&batch.template),
        })
    }

    /// Open the per-photo editor: the baseline is the image's effective
    /// vector.
    pub async fn open_adjust_session(&self, image_id: DbId) -> EngineResult<EditSession> {
        let image = self.load_image(image_id).await?;
        let batch = self.get_batch(image.batch_id).await?;
        let baseline = image.effective(&batch.template);

        Ok(EditSession {
            mode: EditMode::Adjust,
            batch_id: batch.id,
            image_id,
            original_url: image.original_url,
            baseline,
            preview: Preview::of(&baseline),
        })
    }

    /// Replace the template with `edited` and re-arm the template photo plus
    /// every image whose effective vector changed under the new template.
    pub async fn finalize_template_edit(
        &self,
        batch_id: DbId,
        template_image_id: Option<DbId>,
        edited: &AdjustmentVector,
    ) -> EngineResult<TemplateUpdate> {
        let edited = validated(edited)?;
        let previous = self.get_batch(batch_id).await?;
        if let Some(image_id) = template_image_id {
            ensure_in_batch(&self.load_image(image_id).await?, batch_id)?;
        }

        let batch = self
            .rows
            .replace_template(batch_id, &edited)
            .await?
            .ok_or_else(|| EngineError::not_found("Batch", batch_id))?;
        tracing::info!(%batch_id, "Template replaced");

        let to_rearm: Vec<DbId> = self
            .rows
            .list_images(batch_id)
            .await?
            .into_iter()
            .filter(|image| {
                Some(image.id) == template_image_id
                    || image.effective(&previous.template) != image.effective(&edited)
            })
            .map(|image| image.id)
            .collect();

        let rearmed = self.coordinator.rearm_all(batch_id, &to_rearm).await?;
        tracing::info!(%batch_id, rearmed, "Template edit finalized");

        Ok(TemplateUpdate { batch, rearmed })
    }

    /// Commit an adjust session to its photo only.
    ///
    /// The stored override is re-read just before the merge so fields saved
    /// since the session opened survive.
    pub async fn save_for_this_photo(
        &self,
        image_id: DbId,
        baseline: &AdjustmentVector,
        edited: &AdjustmentVector,
    ) -> EngineResult<Image> {
        let changed = diff(&validated(edited)?, &validated(baseline)?);

        let current = self.load_image(image_id).await?;
        let merged = merge_override(&current.override_settings, &changed);

        let image = self
            .rows
            .write_override(image_id, &merged)
            .await?
            .ok_or_else(|| EngineError::not_found("Image", image_id))?;

        tracing::info!(
            batch_id = %image.batch_id,
            %image_id,
            changed = changed.len(),
            "Override saved for photo"
        );
        Ok(image)
    }

    /// Commit an adjust session to the whole batch.
    ///
    /// The template is replaced with `edited` first, so later uploads inherit
    /// it even if the fan-out then fails part-way.
    pub async fn apply_adjusted_to_all(
        &self,
        batch_id: DbId,
        baseline: &AdjustmentVector,
        edited: &AdjustmentVector,
    ) -> EngineResult<PropagationReport> {
        let edited = validated(edited)?;
        let changed = diff(&edited, &validated(baseline)?);

        self.rows
            .replace_template(batch_id, &edited)
            .await?
            .ok_or_else(|| EngineError::not_found("Batch", batch_id))?;
        tracing::info!(%batch_id, changed = changed.len(), "Template replaced before propagation");

        self.coordinator.apply_to_all(batch_id, &changed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchtone_core::settings::AdjustmentField;

    #[test]
    fn preview_renders_css() {
        let v = AdjustmentVector::default()
            .with(AdjustmentField::Warmth, 50.0)
            .with(AdjustmentField::Tint, 90.0);
        let preview = Preview::of(&v);
        assert_eq!(
            preview.filter,
            "brightness(1.000) contrast(1.000) saturate(1.000) sepia(0.200) hue-rotate(0.0deg)"
        );
        assert_eq!(preview.overlay, "rgba(255, 0, 255, 0.125)");
    }

    #[test]
    fn edited_vector_out_of_range_is_rejected() {
        let v = AdjustmentVector::default().with(AdjustmentField::Saturation, 3.5);
        assert!(matches!(validated(&v), Err(CoreError::Validation(_))));
    }
}
