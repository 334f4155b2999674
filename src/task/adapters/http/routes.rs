//! Axum router exposing the task CRUD surface.
//!
//! Routes:
//! - `POST   /tasks`                     create a task (201)
//! - `GET    /tasks/{partitionKey}/{id}` read a task
//! - `PUT    /tasks/{partitionKey}/{id}` partially update a task
//! - `DELETE /tasks/{partitionKey}/{id}` delete a task and its archive blob
//!
//! Task responses carry an `ETag` header with the version token. `PUT` and
//! `DELETE` honour `If-Match`. A `PUT` to a missing task is a 404 even when
//! its body would be rejected.

use super::{
    ApiError,
    dto::{CreateTaskBody, UpdateTaskBody},
};
use crate::task::{
    domain::{Task, TaskKey, TaskSnapshot, VersionToken},
    ports::{ArchiveStore, TaskStore, WorkQueue},
    services::TaskCoordinator,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

type CoordinatorState<S, Q, A> = Arc<TaskCoordinator<S, Q, A>>;

/// Builds the task router over a shared coordinator.
pub fn router<S, Q, A>(coordinator: CoordinatorState<S, Q, A>) -> Router
where
    S: TaskStore + 'static,
    Q: WorkQueue + 'static,
    A: ArchiveStore + 'static,
{
    Router::new()
        .route("/tasks", post(create_task::<S, Q, A>))
        .route(
            "/tasks/{partition_key}/{id}",
            get(get_task::<S, Q, A>)
                .put(update_task::<S, Q, A>)
                .delete(delete_task::<S, Q, A>),
        )
        .with_state(coordinator)
}

async fn create_task<S, Q, A>(
    State(coordinator): State<CoordinatorState<S, Q, A>>,
    payload: Result<Json<CreateTaskBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
    S: TaskStore,
    Q: WorkQueue,
    A: ArchiveStore,
{
    let Json(body) = payload?;
    let task = coordinator.create(body.into_request()).await?;
    Ok(task_response(StatusCode::CREATED, &task))
}

async fn get_task<S, Q, A>(
    State(coordinator): State<CoordinatorState<S, Q, A>>,
    Path((partition_key, id)): Path<(String, String)>,
) -> Result<Response, ApiError>
where
    S: TaskStore,
    Q: WorkQueue,
    A: ArchiveStore,
{
    let key = parse_key(&partition_key, &id)?;
    let task = coordinator.get(&key).await?;
    Ok(task_response(StatusCode::OK, &task))
}

async fn update_task<S, Q, A>(
    State(coordinator): State<CoordinatorState<S, Q, A>>,
    Path((partition_key, id)): Path<(String, String)>,
    headers: HeaderMap,
    payload: Result<Json<UpdateTaskBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
    S: TaskStore,
    Q: WorkQueue,
    A: ArchiveStore,
{
    let key = parse_key(&partition_key, &id)?;
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            coordinator.get(&key).await?;
            return Err(rejection.into());
        }
    };
    let mut request = body.into_request();
    if let Some(expected) = if_match(&headers)? {
        request = request.with_expected_version(expected);
    }
    let task = coordinator.update(&key, request).await?;
    Ok(task_response(StatusCode::OK, &task))
}

async fn delete_task<S, Q, A>(
    State(coordinator): State<CoordinatorState<S, Q, A>>,
    Path((partition_key, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError>
where
    S: TaskStore,
    Q: WorkQueue,
    A: ArchiveStore,
{
    let key = parse_key(&partition_key, &id)?;
    let expected = if_match(&headers)?;
    coordinator.delete(&key, expected.as_ref()).await?;
    Ok(StatusCode::OK)
}

/// A path that cannot name a stored task is reported as missing.
fn parse_key(partition_key: &str, id: &str) -> Result<TaskKey, ApiError> {
    TaskKey::from_parts(partition_key, id)
        .map_err(|_| ApiError::NotFound(format!("task not found: {partition_key}/{id}")))
}

/// Reads `If-Match`; the wildcard `*` imposes no precondition.
fn if_match(headers: &HeaderMap) -> Result<Option<VersionToken>, ApiError> {
    let Some(raw) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };
    let value = raw
        .to_str()
        .map_err(|_| ApiError::Validation("If-Match header is not valid text".to_owned()))?
        .trim();
    if value.is_empty() || value == "*" {
        return Ok(None);
    }
    Ok(Some(VersionToken::new(value)))
}

fn task_response(status: StatusCode, task: &Task) -> Response {
    (
        status,
        [(header::ETAG, task.version().as_str().to_owned())],
        Json(TaskSnapshot::from(task)),
    )
        .into_response()
}
