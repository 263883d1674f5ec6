//! Integration tests for uploads and the polling reads.

mod common;

use axum::http::{Method, StatusCode};
use batchtone_engine::store::WorkerStore;
use common::{body_json, build_test_app, get, jpeg, json_request, start_batch, upload, vector, Part};
use serde_json::json;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// First upload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_upload_without_session_creates_one() {
    let app = build_test_app();
    let response = upload(&app.router, "/api/v1/batches", None, &[jpeg("IMG_1.JPG")]).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let data = &json["data"];

    assert!(data["session"]["token"].is_string());
    assert_eq!(data["session"]["user_id"], data["batch"]["user_id"]);
    assert_eq!(data["batch"]["template"], vector(json!({})));
    assert_eq!(data["image"]["status"], "pending");
    assert!(data["image"]["edited_url"].is_null());
    assert!(data["image"]["original_url"]
        .as_str()
        .unwrap()
        .ends_with(".jpg"));
    assert_eq!(app.blobs.count().await, 1);
}

#[tokio::test]
async fn first_upload_with_session_reuses_it() {
    let app = build_test_app();
    let (token, _, _) = start_batch(&app.router).await;

    let response = upload(&app.router, "/api/v1/batches", Some(&token), &[jpeg("b.jpg")]).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["data"]["session"].is_null());
}

#[tokio::test]
async fn first_upload_requires_exactly_one_file() {
    let app = build_test_app();
    let response = upload(
        &app.router,
        "/api/v1/batches",
        None,
        &[jpeg("a.jpg"), jpeg("b.jpg")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
    assert_eq!(app.blobs.count().await, 0);
}

#[tokio::test]
async fn unsupported_type_is_rejected() {
    let app = build_test_app();
    let gif = Part {
        file_name: "anim.gif",
        content_type: "image/gif",
        bytes: b"GIF89a",
    };
    let response = upload(&app.router, "/api/v1/batches", None, &[gif]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn garbage_token_is_rejected_on_first_upload() {
    let app = build_test_app();
    let response = upload(
        &app.router,
        "/api/v1/batches",
        Some("not-a-jwt"),
        &[jpeg("a.jpg")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Adding photos
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_images_requires_session() {
    let app = build_test_app();
    let (_, batch_id, _) = start_batch(&app.router).await;

    let uri = format!("/api/v1/batches/{batch_id}/images");
    let response = upload(&app.router, &uri, None, &[jpeg("b.jpg")]).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn add_images_truncates_at_batch_limit() {
    let app = build_test_app();
    let (token, batch_id, _) = start_batch(&app.router).await;

    let uri = format!("/api/v1/batches/{batch_id}/images");
    let response = upload(
        &app.router,
        &uri,
        Some(&token),
        &[jpeg("b.jpg"), jpeg("c.jpg"), jpeg("d.jpg")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["images"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"]["skipped"], 1);
    assert_eq!(
        json["data"]["notice"],
        "Only 2 of 3 photos added (batch limit is 3)"
    );
    assert_eq!(app.blobs.count().await, 3);
}

#[tokio::test]
async fn add_images_to_full_batch_is_a_conflict() {
    let app = build_test_app();
    let (token, batch_id, _) = start_batch(&app.router).await;
    let uri = format!("/api/v1/batches/{batch_id}/images");
    upload(&app.router, &uri, Some(&token), &[jpeg("b.jpg"), jpeg("c.jpg")]).await;

    let response = upload(&app.router, &uri, Some(&token), &[jpeg("d.jpg")]).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "BATCH_FULL");
}

#[tokio::test]
async fn add_images_to_someone_elses_batch_is_not_found() {
    let app = build_test_app();
    let (_, batch_id, _) = start_batch(&app.router).await;
    let (other_token, _, _) = start_batch(&app.router).await;

    let uri = format!("/api/v1/batches/{batch_id}/images");
    let response = upload(&app.router, &uri, Some(&other_token), &[jpeg("x.jpg")]).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Polling reads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_batch_returns_404() {
    let app = build_test_app();
    let response = get(&app.router, &format!("/api/v1/batches/{}", Uuid::nil())).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn list_images_in_upload_order() {
    let app = build_test_app();
    let (token, batch_id, first_id) = start_batch(&app.router).await;
    let uri = format!("/api/v1/batches/{batch_id}/images");
    let added = body_json(
        upload(&app.router, &uri, Some(&token), &[jpeg("b.jpg"), jpeg("c.jpg")]).await,
    )
    .await;

    let json = body_json(get(&app.router, &uri).await).await;
    let ids: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|image| image["id"].as_str().unwrap())
        .collect();

    assert_eq!(
        ids,
        [
            first_id.as_str(),
            added["data"]["images"][0]["id"].as_str().unwrap(),
            added["data"]["images"][1]["id"].as_str().unwrap(),
        ]
    );
}

#[tokio::test]
async fn progress_counts_statuses() {
    let app = build_test_app();
    let (_, batch_id, first_id) = start_batch(&app.router).await;

    let uri = format!("/api/v1/batches/{batch_id}/progress");
    let json = body_json(get(&app.router, &uri).await).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["pending"], 1);
    assert_eq!(json["data"]["percent_done"], 0);
    assert_eq!(json["data"]["all_done"], false);
    assert_eq!(json["data"]["poll_interval_secs"], 3);

    let id: Uuid = first_id.parse().unwrap();
    let image = app.rows.list_pending(10).await.unwrap().remove(0);
    assert!(app.rows.claim(id, image.revision).await.unwrap());
    assert!(app
        .rows
        .complete(id, image.revision, "mem://edited/a.jpg")
        .await
        .unwrap());

    let json = body_json(get(&app.router, &uri).await).await;
    assert_eq!(json["data"]["done"], 1);
    assert_eq!(json["data"]["percent_done"], 100);
    assert_eq!(json["data"]["all_done"], true);
}

#[tokio::test]
async fn edited_url_is_hidden_once_rearmed() {
    let app = build_test_app();
    let (_, batch_id, first_id) = start_batch(&app.router).await;
    let id: Uuid = first_id.parse().unwrap();
    let image = app.rows.list_pending(10).await.unwrap().remove(0);
    app.rows.claim(id, image.revision).await.unwrap();
    app.rows
        .complete(id, image.revision, "mem://edited/a.jpg")
        .await
        .unwrap();

    let images_uri = format!("/api/v1/batches/{batch_id}/images");
    let json = body_json(get(&app.router, &images_uri).await).await;
    assert_eq!(json["data"][0]["edited_url"], "mem://edited/a.jpg");

    let response = json_request(
        &app.router,
        Method::PUT,
        &format!("/api/v1/batches/{batch_id}/template"),
        json!({ "template": vector(json!({ "hue": 90.0 })), "template_image_id": first_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get(&app.router, &images_uri).await).await;
    assert_eq!(json["data"][0]["status"], "pending");
    assert!(json["data"][0]["edited_url"].is_null());
}
