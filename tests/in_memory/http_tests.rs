//! HTTP surface tests driven through `tower::ServiceExt::oneshot`.

use super::helpers::{TestApp, app, task_path};
use axum::http::{Method, StatusCode};
use eyre::{ensure, eyre};
use rstest::rstest;
use tracker::task::domain::TaskId;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn post_creates_task_with_etag(app: TestApp) -> eyre::Result<()> {
    let response = app
        .create(r#"{"name": "Write report", "dueDate": "2025-01-10"}"#)
        .await?;

    ensure!(response.status == StatusCode::CREATED, "status {}", response.status);
    ensure!(response.body["name"] == "Write report", "name");
    ensure!(response.body["status"] == "ToDo", "status field");
    ensure!(response.body["dueDate"] == "2025-01-10", "due date");
    ensure!(response.body["partitionKey"] == "TasksPartition", "partition");
    let etag = response.etag().ok_or_else(|| eyre!("missing ETag"))?;
    ensure!(response.body["versionToken"] == etag.as_str(), "ETag mismatch");
    Ok(())
}

#[rstest]
#[case(r#"{"name": ""}"#)]
#[case(r#"{"name": "   "}"#)]
#[case(r#"{"dueDate": "2025-01-10"}"#)]
#[case(r#"{}"#)]
#[tokio::test(flavor = "multi_thread")]
async fn post_without_usable_name_is_rejected(app: TestApp, #[case] body: &str) -> eyre::Result<()> {
    let response = app.create(body).await?;

    ensure!(response.status == StatusCode::BAD_REQUEST, "status {}", response.status);
    ensure!(response.body["code"] == "VALIDATION_FAILED", "code");
    ensure!(app.queue.is_empty()?, "nothing should be published");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_json_is_a_bad_request(app: TestApp) -> eyre::Result<()> {
    let response = app.create("{\"name\": ").await?;
    ensure!(response.status == StatusCode::BAD_REQUEST, "status {}", response.status);
    ensure!(response.body["code"] == "VALIDATION_FAILED", "code");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn get_returns_created_task(app: TestApp) -> eyre::Result<()> {
    let created = app.create(r#"{"name": "Write report"}"#).await?;
    let path = task_path(&created.body)?;

    let fetched = app.send(Method::GET, &path, None, &[]).await?;

    ensure!(fetched.status == StatusCode::OK, "status {}", fetched.status);
    ensure!(fetched.body == created.body, "body should round-trip");
    ensure!(fetched.etag() == created.etag(), "ETag should match");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn get_of_unknown_id_is_not_found(app: TestApp) -> eyre::Result<()> {
    let missing = format!("/tasks/TasksPartition/{}", TaskId::new());
    for uri in ["/tasks/TasksPartition/not-a-uuid", missing.as_str()] {
        let response = app.send(Method::GET, uri, None, &[]).await?;
        ensure!(response.status == StatusCode::NOT_FOUND, "{uri}: {}", response.status);
        ensure!(response.body["code"] == "NOT_FOUND", "{uri}: code");
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn put_applies_partial_update(app: TestApp) -> eyre::Result<()> {
    let created = app
        .create(r#"{"name": "Write report", "dueDate": "2025-01-10"}"#)
        .await?;
    let path = task_path(&created.body)?;

    let updated = app
        .send(Method::PUT, &path, Some(r#"{"status": "Done"}"#), &[])
        .await?;

    ensure!(updated.status == StatusCode::OK, "status {}", updated.status);
    ensure!(updated.body["status"] == "Done", "status field");
    ensure!(updated.body["name"] == "Write report", "name untouched");
    ensure!(updated.body["dueDate"] == "2025-01-10", "due date untouched");
    ensure!(updated.etag() != created.etag(), "version should advance");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn put_null_due_date_clears_it(app: TestApp) -> eyre::Result<()> {
    let created = app
        .create(r#"{"name": "Write report", "dueDate": "2025-01-10"}"#)
        .await?;
    let path = task_path(&created.body)?;

    let updated = app
        .send(Method::PUT, &path, Some(r#"{"dueDate": null}"#), &[])
        .await?;

    ensure!(updated.status == StatusCode::OK, "status {}", updated.status);
    ensure!(updated.body["dueDate"].is_null(), "due date should be cleared");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn put_with_stale_if_match_conflicts(app: TestApp) -> eyre::Result<()> {
    let created = app.create(r#"{"name": "Write report"}"#).await?;
    let path = task_path(&created.body)?;
    let stale = created.etag().ok_or_else(|| eyre!("missing ETag"))?;
    let first = app
        .send(Method::PUT, &path, Some(r#"{"status": "InProgress"}"#), &[("if-match", stale.as_str())])
        .await?;
    ensure!(first.status == StatusCode::OK, "first update {}", first.status);

    let second = app
        .send(Method::PUT, &path, Some(r#"{"status": "Done"}"#), &[("if-match", stale.as_str())])
        .await?;

    ensure!(second.status == StatusCode::CONFLICT, "status {}", second.status);
    ensure!(second.body["code"] == "CONFLICT", "code");
    let current = app.send(Method::GET, &path, None, &[]).await?;
    ensure!(current.body["status"] == "InProgress", "record should be unchanged");
    Ok(())
}

#[rstest]
#[case(r#"{"name": ""}"#)]
#[case(r#"{"status": "Archived"}"#)]
#[tokio::test(flavor = "multi_thread")]
async fn put_with_invalid_fields_is_rejected(app: TestApp, #[case] body: &str) -> eyre::Result<()> {
    let created = app.create(r#"{"name": "Write report"}"#).await?;
    let path = task_path(&created.body)?;

    let response = app.send(Method::PUT, &path, Some(body), &[]).await?;

    ensure!(response.status == StatusCode::BAD_REQUEST, "status {}", response.status);
    let current = app.send(Method::GET, &path, None, &[]).await?;
    ensure!(current.body == created.body, "record should be unchanged");
    Ok(())
}

#[rstest]
#[case(r#"{"status": "Done"}"#)]
#[case(r#"{"name": ""}"#)]
#[case(r#"{"status": "Archived"}"#)]
#[case("{\"name\": ")]
#[tokio::test(flavor = "multi_thread")]
async fn put_of_missing_task_is_not_found(app: TestApp, #[case] body: &str) -> eyre::Result<()> {
    let path = format!("/tasks/TasksPartition/{}", TaskId::new());
    let response = app.send(Method::PUT, &path, Some(body), &[]).await?;
    ensure!(response.status == StatusCode::NOT_FOUND, "status {}", response.status);
    ensure!(response.body["code"] == "NOT_FOUND", "code");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn put_malformed_body_to_existing_task_is_a_bad_request(app: TestApp) -> eyre::Result<()> {
    let created = app.create(r#"{"name": "Write report"}"#).await?;
    let path = task_path(&created.body)?;

    let response = app.send(Method::PUT, &path, Some("{\"status\": "), &[]).await?;

    ensure!(response.status == StatusCode::BAD_REQUEST, "status {}", response.status);
    ensure!(response.body["code"] == "VALIDATION_FAILED", "code");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_task_then_reports_not_found(app: TestApp) -> eyre::Result<()> {
    let created = app.create(r#"{"name": "Write report"}"#).await?;
    let path = task_path(&created.body)?;

    let deleted = app.send(Method::DELETE, &path, None, &[]).await?;
    ensure!(deleted.status == StatusCode::OK, "status {}", deleted.status);

    let fetched = app.send(Method::GET, &path, None, &[]).await?;
    ensure!(fetched.status == StatusCode::NOT_FOUND, "get after delete {}", fetched.status);
    let again = app.send(Method::DELETE, &path, None, &[]).await?;
    ensure!(again.status == StatusCode::NOT_FOUND, "second delete {}", again.status);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_with_stale_if_match_conflicts(app: TestApp) -> eyre::Result<()> {
    let created = app.create(r#"{"name": "Write report"}"#).await?;
    let path = task_path(&created.body)?;

    let response = app
        .send(Method::DELETE, &path, None, &[("if-match", "W/\"999\"")])
        .await?;

    ensure!(response.status == StatusCode::CONFLICT, "status {}", response.status);
    let fetched = app.send(Method::GET, &path, None, &[]).await?;
    ensure!(fetched.status == StatusCode::OK, "task should remain");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn end_to_end_archive_follows_updates(app: TestApp) -> eyre::Result<()> {
    let created = app.create(r#"{"name": "Write report"}"#).await?;
    let path = task_path(&created.body)?;
    let id = created.body["id"]
        .as_str()
        .ok_or_else(|| eyre!("missing id"))?
        .parse::<TaskId>()?;
    let blob_key = tracker::task::domain::ArchiveKey::for_task(id);

    ensure!(app.drain().await? == 1, "one snapshot after create");
    let first: serde_json::Value = read_blob(&app, &blob_key).await?;
    ensure!(first["status"] == "ToDo", "archive should show ToDo");

    let updated = app
        .send(Method::PUT, &path, Some(r#"{"status": "Done"}"#), &[])
        .await?;
    ensure!(updated.status == StatusCode::OK, "update {}", updated.status);
    ensure!(app.drain().await? == 1, "one snapshot after update");
    let second = read_blob(&app, &blob_key).await?;
    ensure!(second == updated.body, "archive should match the latest task");

    let deleted = app.send(Method::DELETE, &path, None, &[]).await?;
    ensure!(deleted.status == StatusCode::OK, "delete {}", deleted.status);
    ensure!(app.archive.is_empty()?, "delete should remove the blob");
    ensure!(app.drain().await? == 0, "delete publishes nothing");
    Ok(())
}

async fn read_blob(
    app: &TestApp,
    key: &tracker::task::domain::ArchiveKey,
) -> eyre::Result<serde_json::Value> {
    use tracker::task::ports::ArchiveStore;

    let bytes = app
        .archive
        .get(key)
        .await?
        .ok_or_else(|| eyre!("blob {key} missing"))?;
    Ok(serde_json::from_slice(&bytes)?)
}
