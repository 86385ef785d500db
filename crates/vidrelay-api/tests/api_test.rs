//! API integration tests.
//!
//! Run with: `cargo test -p vidrelay-api --test api_test`

mod helpers;

use helpers::{setup_test_app, setup_test_app_with, FakeProvider, FAKE_MEDIA};
use serde_json::{json, Value};
use vidrelay_core::Config;

#[tokio::test]
async fn test_detect_returns_metadata_for_youtube_url() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/detect")
        .json(&json!({"url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["title"], json!("Test Video"));
    assert!(!body["data"]["thumbnail"].as_str().unwrap().is_empty());
    assert!(!body["data"]["formats"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_detect_unsupported_url_never_invokes_provider() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/detect")
        .json(&json!({"url": "not-a-url"}))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], json!(true));
    assert!(!body["message"].as_str().unwrap().is_empty());
    assert_eq!(app.provider.probe_count(), 0);

    let response = app
        .server
        .post("/api/detect")
        .json(&json!({"url": "https://example.com/some-video"}))
        .await;

    response.assert_status_bad_request();
    assert_eq!(app.provider.probe_count(), 0);
}

#[tokio::test]
async fn test_detect_missing_url_field_is_bad_request() {
    let app = setup_test_app().await;

    let response = app.server.post("/api/detect").json(&json!({})).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], json!(true));
}

#[tokio::test]
async fn test_detect_bounds_format_list_in_stable_order() {
    let app = setup_test_app_with(Config::default(), FakeProvider::with_formats(25)).await;

    let response = app
        .server
        .post("/api/detect")
        .json(&json!({"url": "https://youtu.be/dQw4w9WgXcQ"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let formats = body["data"]["formats"].as_array().unwrap();
    assert_eq!(formats.len(), 10);

    let ids: Vec<&str> = formats
        .iter()
        .map(|f| f["format_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]);
}

#[tokio::test]
async fn test_download_then_deliver_succeeds_exactly_once() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/download")
        .json(&json!({"url": "https://youtu.be/dQw4w9WgXcQ", "formatId": "22"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], json!(true));
    let filename = body["filename"].as_str().unwrap().to_string();
    let download_url = body["downloadUrl"].as_str().unwrap().to_string();
    assert_eq!(download_url, format!("/api/download/file/{}", filename));
    assert_eq!(body["size"], json!(FAKE_MEDIA.len()));

    // First delivery streams the file as an attachment.
    let response = app.server.get(&download_url).await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), FAKE_MEDIA);
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("attachment"));

    // The file is deleted after transfer; a second request finds nothing.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(app.stored_files().await.is_empty());

    let response = app.server.get(&download_url).await;
    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"], json!(true));
}

#[tokio::test]
async fn test_download_unknown_format_leaves_no_files() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/download")
        .json(&json!({"url": "https://youtu.be/dQw4w9WgXcQ", "formatId": "bad"}))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], json!(true));
    assert!(app.stored_files().await.is_empty());
}

#[tokio::test]
async fn test_download_requires_both_fields() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/download")
        .json(&json!({"url": "https://youtu.be/x"}))
        .await;
    response.assert_status_bad_request();

    let response = app
        .server
        .post("/api/download")
        .json(&json!({"url": "  ", "formatId": "22"}))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_deliver_traversal_never_escapes_storage_root() {
    let app = setup_test_app().await;

    // Plant a file outside the storage root; a traversal filename must not
    // reach it.
    let secret = app.temp_dir.path().parent().unwrap().join("secret.txt");
    tokio::fs::write(&secret, b"secret").await.ok();

    let response = app
        .server
        .get("/api/download/file/..%2F..%2Fsecret.txt")
        .await;
    response.assert_status_not_found();

    let response = app.server.get("/api/download/file/%2E%2E").await;
    assert!(
        response.status_code() == 403 || response.status_code() == 404,
        "expected rejection, got {}",
        response.status_code()
    );

    tokio::fs::remove_file(&secret).await.ok();
}

#[tokio::test]
async fn test_rate_limit_returns_429_after_budget() {
    let mut config = Config::default();
    config.rate_limit_max_requests = 2;
    let app = setup_test_app_with(config, FakeProvider::new()).await;

    let body = json!({"url": "https://youtu.be/dQw4w9WgXcQ"});
    app.server.post("/api/detect").json(&body).await.assert_status_ok();
    app.server.post("/api/detect").json(&body).await.assert_status_ok();

    let response = app.server.post("/api/detect").json(&body).await;
    assert_eq!(response.status_code(), 429);
    assert!(response.headers().get("retry-after").is_some());
    let body: Value = response.json();
    assert_eq!(body["error"], json!(true));
}

#[tokio::test]
async fn test_health_check_reports_ok() {
    let app = setup_test_app().await;

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["storage"], json!("healthy"));
    assert!(body["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn test_openapi_document_lists_api_paths() {
    let app = setup_test_app().await;

    let response = app.server.get("/api/openapi.json").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let paths = body["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/detect"));
    assert!(paths.contains_key("/api/download"));
    assert!(paths.contains_key("/api/download/file/{filename}"));
}
