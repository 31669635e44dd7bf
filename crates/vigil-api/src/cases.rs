//! Handlers for `/cases` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/cases` | Emergency trigger; 409 if a case is already open |
//! | `GET`  | `/cases` | Optional `?status=missing\|found&limit=&offset=` |
//! | `GET`  | `/cases/:id` | 404 if not found |
//! | `PUT`  | `/cases/:id/found` | Close a case; 409 if already found |
//! | `PUT`  | `/cases/:id/location` | Track a still-open case; 409 once found |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use vigil_core::{
  case::{CaseStatus, MissingCase},
  store::{CaseQuery, PresenceStore},
};
use vigil_engine::Engine;

use crate::error::ApiError;

// ─── Open ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OpenBody {
  pub ward_id:   Uuid,
  pub latitude:  Option<f64>,
  pub longitude: Option<f64>,
  pub note:      Option<String>,
}

/// `POST /cases` — the external emergency trigger. Shares the one-open-case
/// dedup guarantee with the stillness sweep.
pub async fn open<S>(
  State(engine): State<Engine<S>>,
  Json(body): Json<OpenBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PresenceStore + 'static,
{
  let position = match (body.latitude, body.longitude) {
    (Some(lat), Some(lng)) => Some((lat, lng)),
    (None, None) => None,
    _ => {
      return Err(ApiError::BadRequest(
        "latitude and longitude must be supplied together".to_string(),
      ));
    }
  };
  let case = engine
    .open_missing_case(body.ward_id, position, body.note, Utc::now())
    .await?;
  Ok((StatusCode::CREATED, Json(case)))
}

// ─── List / get ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<CaseStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /cases[?status=<status>&limit=<n>&offset=<n>]`
pub async fn list<S>(
  State(engine): State<Engine<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<MissingCase>>, ApiError>
where
  S: PresenceStore + 'static,
{
  let cases = engine
    .list_cases(&CaseQuery {
      status: params.status,
      limit:  params.limit,
      offset: params.offset,
    })
    .await?;
  Ok(Json(cases))
}

/// `GET /cases/:id`
pub async fn get_one<S>(
  State(engine): State<Engine<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<MissingCase>, ApiError>
where
  S: PresenceStore + 'static,
{
  let case = engine
    .get_case(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("case {id} not found")))?;
  Ok(Json(case))
}

// ─── Found ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct FoundBody {
  pub latitude:  Option<f64>,
  pub longitude: Option<f64>,
  pub note:      Option<String>,
}

/// `PUT /cases/:id/found` — close a case. Position and note fields, where
/// supplied, replace the stored values; omitted fields keep them.
pub async fn mark_found<S>(
  State(engine): State<Engine<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<FoundBody>,
) -> Result<Json<MissingCase>, ApiError>
where
  S: PresenceStore + 'static,
{
  let position = match (body.latitude, body.longitude) {
    (Some(lat), Some(lng)) => Some((lat, lng)),
    (None, None) => None,
    _ => {
      return Err(ApiError::BadRequest(
        "latitude and longitude must be supplied together".to_string(),
      ));
    }
  };
  let case = engine.mark_case_found(id, position, body.note).await?;
  Ok(Json(case))
}

// ─── Track ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TrackBody {
  pub latitude:  f64,
  pub longitude: f64,
  pub at:        Option<DateTime<Utc>>,
}

/// `PUT /cases/:id/location` — update the last-known position of a case that
/// is still open.
pub async fn update_position<S>(
  State(engine): State<Engine<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<TrackBody>,
) -> Result<Json<MissingCase>, ApiError>
where
  S: PresenceStore + 'static,
{
  let at = body.at.unwrap_or_else(Utc::now);
  let case = engine
    .update_case_position(id, body.latitude, body.longitude, at)
    .await?;
  Ok(Json(case))
}
