//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<vigil_core::Error> for ApiError {
  fn from(e: vigil_core::Error) -> Self {
    use vigil_core::Error;
    match e {
      Error::WardNotFound(_) | Error::CaseNotFound(_) => {
        ApiError::NotFound(e.to_string())
      }
      Error::InvalidCoordinates { .. } => ApiError::BadRequest(e.to_string()),
      Error::CaseAlreadyOpen { .. } | Error::CaseAlreadyFound(_) => {
        ApiError::Conflict(e.to_string())
      }
      Error::Store(inner) => ApiError::Store(inner),
      Error::Serialization(inner) => ApiError::Store(Box::new(inner)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
