//! HTTP adapter exposing the task coordinator through axum.

mod dto;
mod error;
mod routes;

pub use dto::{CreateTaskBody, UpdateTaskBody};
pub use error::ApiError;
pub use routes::router;
