//! Edit sessions and commits: template finalize, per-photo save, baselines.

mod common;

use assert_matches::assert_matches;
use batchtone_core::error::CoreError;
use batchtone_core::image_status::ImageStatus;
use batchtone_core::settings::{AdjustmentField::*, AdjustmentVector, PartialAdjustmentVector};
use batchtone_engine::editing::EditMode;
use batchtone_engine::store::{RowStore, WorkerStore};
use batchtone_engine::EngineError;
use common::{seed_batch, test_engine};

#[tokio::test]
async fn template_session_starts_from_template() {
    let t = test_engine();
    let (_, first, _) = seed_batch(&t.engine, 1).await;

    let session = t
        .engine
        .open_template_session(first.batch.id, first.image.id)
        .await
        .unwrap();
    assert_eq!(session.mode, EditMode::Template);
    assert_eq!(session.baseline, AdjustmentVector::default());
    assert_eq!(session.original_url, first.image.original_url);
    assert_eq!(session.preview.overlay, "transparent");
}

#[tokio::test]
async fn adjust_session_starts_from_effective_vector() {
    let t = test_engine();
    let (_, first, _) = seed_batch(&t.engine, 1).await;
    let template = AdjustmentVector::default().with(Brightness, 1.3);
    t.engine
        .finalize_template_edit(first.batch.id, Some(first.image.id), &template)
        .await
        .unwrap();
    t.rows
        .write_override(first.image.id, &PartialAdjustmentVector::empty().with(Tint, -90.0))
        .await
        .unwrap();

    let session = t.engine.open_adjust_session(first.image.id).await.unwrap();
    assert_eq!(session.mode, EditMode::Adjust);
    assert_eq!(session.baseline, template.with(Tint, -90.0));
    assert_eq!(session.preview.overlay, "rgba(0, 255, 0, 0.125)");
}

#[tokio::test]
async fn template_session_rejects_image_from_other_batch() {
    let t = test_engine();
    let (_, a, _) = seed_batch(&t.engine, 1).await;
    let (_, b, _) = seed_batch(&t.engine, 1).await;

    let err = t
        .engine
        .open_template_session(a.batch.id, b.image.id)
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::Core(CoreError::Validation(_)));
}

#[tokio::test]
async fn finalize_replaces_template_and_rearms_changed_images() {
    let t = test_engine();
    let (_, first, images) = seed_batch(&t.engine, 3).await;

    // Every image done; photo 2 overrides brightness so a brightness-only
    // template change leaves its effective vector alone.
    t.rows
        .write_override(images[2].id, &PartialAdjustmentVector::empty().with(Brightness, 0.8))
        .await
        .unwrap();
    for image in &images {
        let rev = t.rows.get_image(image.id).await.unwrap().unwrap().revision;
        assert!(t.rows.claim(image.id, rev).await.unwrap());
        assert!(t.rows.complete(image.id, rev, "mem://edited/x.jpg").await.unwrap());
    }

    let edited = AdjustmentVector::default().with(Brightness, 1.6);
    let update = t
        .engine
        .finalize_template_edit(first.batch.id, Some(images[0].id), &edited)
        .await
        .unwrap();
    assert_eq!(update.batch.template, edited);
    assert_eq!(update.rearmed, 2);

    let statuses: Vec<ImageStatus> = t
        .engine
        .list_images(first.batch.id)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.status)
        .collect();
    assert_eq!(statuses, [ImageStatus::Pending, ImageStatus::Pending, ImageStatus::Done]);
}

#[tokio::test]
async fn finalize_rearms_template_photo_even_without_change() {
    let t = test_engine();
    let (_, first, _) = seed_batch(&t.engine, 1).await;

    let update = t
        .engine
        .finalize_template_edit(first.batch.id, Some(first.image.id), &AdjustmentVector::default())
        .await
        .unwrap();
    assert_eq!(update.rearmed, 1);
    let image = t.rows.get_image(first.image.id).await.unwrap().unwrap();
    assert_eq!(image.revision, 1);
}

#[tokio::test]
async fn finalize_rejects_out_of_range_template() {
    let t = test_engine();
    let (_, first, _) = seed_batch(&t.engine, 1).await;
    let edited = AdjustmentVector::default().with(BlackPoint, -1.0);

    let err = t
        .engine
        .finalize_template_edit(first.batch.id, None, &edited)
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::Core(CoreError::Validation(_)));
    assert_eq!(
        t.engine.get_batch(first.batch.id).await.unwrap().template,
        AdjustmentVector::default()
    );
}

#[tokio::test]
async fn save_for_this_photo_writes_only_moved_fields() {
    let t = test_engine();
    let (_, first, images) = seed_batch(&t.engine, 2).await;

    let session = t.engine.open_adjust_session(images[1].id).await.unwrap();
    // Only contrast differs from the baseline.
    let edited = session.baseline.with(Contrast, 1.25);
    let image = t
        .engine
        .save_for_this_photo(images[1].id, &session.baseline, &edited)
        .await
        .unwrap();

    assert_eq!(image.override_settings, PartialAdjustmentVector::empty().with(Contrast, 1.25));
    assert_eq!(image.status().unwrap(), ImageStatus::Pending);
    assert_eq!(image.revision, 1);

    let other = t.rows.get_image(first.image.id).await.unwrap().unwrap();
    assert!(other.override_settings.is_empty());
    assert_eq!(other.revision, 0);
}

#[tokio::test]
async fn save_for_this_photo_merges_with_stored_override() {
    let t = test_engine();
    let (_, _, images) = seed_batch(&t.engine, 1).await;
    let id = images[0].id;

    let session = t.engine.open_adjust_session(id).await.unwrap();

    // Saved elsewhere after the session opened.
    t.rows
        .write_override(id, &PartialAdjustmentVector::empty().with(Hue, 45.0))
        .await
        .unwrap();

    let edited = session.baseline.with(Saturation, 2.0);
    let image = t
        .engine
        .save_for_this_photo(id, &session.baseline, &edited)
        .await
        .unwrap();
    assert_eq!(
        image.override_settings,
        PartialAdjustmentVector::empty()
            .with(Saturation, 2.0)
            .with(Hue, 45.0)
    );
}

#[tokio::test]
async fn field_set_back_to_default_is_still_an_override() {
    let t = test_engine();
    let (_, first, images) = seed_batch(&t.engine, 1).await;
    let template = AdjustmentVector::default().with(Warmth, 40.0);
    t.engine
        .finalize_template_edit(first.batch.id, None, &template)
        .await
        .unwrap();

    let session = t.engine.open_adjust_session(images[0].id).await.unwrap();
    let edited = session.baseline.with(Warmth, 0.0);
    let image = t
        .engine
        .save_for_this_photo(images[0].id, &session.baseline, &edited)
        .await
        .unwrap();
    assert_eq!(image.override_settings.warmth, Some(0.0));

    // A later template change does not reach the overridden field.
    t.engine
        .finalize_template_edit(first.batch.id, None, &template.with(Warmth, 80.0))
        .await
        .unwrap();
    let views = t.engine.list_images(first.batch.id).await.unwrap();
    assert_eq!(views[0].effective.warmth, 0.0);
}

#[tokio::test]
async fn rearm_keeps_edited_url_stored_but_stale() {
    let t = test_engine();
    let (_, first, images) = seed_batch(&t.engine, 1).await;
    let id = images[0].id;

    assert!(t.rows.claim(id, 0).await.unwrap());
    assert!(t.rows.complete(id, 0, "mem://edited/a_1.jpg").await.unwrap());
    let done = t.engine.list_images(first.batch.id).await.unwrap();
    assert_eq!(done[0].edited_url.as_deref(), Some("mem://edited/a_1.jpg"));

    let session = t.engine.open_adjust_session(id).await.unwrap();
    t.engine
        .save_for_this_photo(id, &session.baseline, &session.baseline.with(Hue, 10.0))
        .await
        .unwrap();

    let stored = t.rows.get_image(id).await.unwrap().unwrap();
    assert_eq!(stored.edited_url.as_deref(), Some("mem://edited/a_1.jpg"));
    let views = t.engine.list_images(first.batch.id).await.unwrap();
    assert_eq!(views[0].status, ImageStatus::Pending);
    assert_eq!(views[0].edited_url, None);
}
