//! Handlers for `/location` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/location` | Report a reading; responds `{is_outside, distance_meters}` |
//! | `GET`  | `/location/:ward_id` | Latest position; 404 if never reported |
//! | `GET`  | `/location` | Latest positions of every reporting ward |

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vigil_core::{location::Position, store::PresenceStore};
use vigil_engine::{Engine, Report};

use crate::error::ApiError;

// ─── Report ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReportBody {
  pub ward_id:   Uuid,
  pub latitude:  f64,
  pub longitude: f64,
  /// Capture time of the reading; defaults to the server clock.
  pub captured_at: Option<DateTime<Utc>>,
}

/// `POST /location` — the primary ingestion endpoint.
pub async fn report<S>(
  State(engine): State<Engine<S>>,
  Json(body): Json<ReportBody>,
) -> Result<Json<Report>, ApiError>
where
  S: PresenceStore + 'static,
{
  let at = body.captured_at.unwrap_or_else(Utc::now);
  let report = engine
    .report_location(body.ward_id, body.latitude, body.longitude, at)
    .await?;
  Ok(Json(report))
}

// ─── Latest position ──────────────────────────────────────────────────────────

/// One entry of the latest-position projection, with its ward id.
#[derive(Debug, Serialize)]
pub struct WardPosition {
  pub ward_id:     Uuid,
  pub latitude:    f64,
  pub longitude:   f64,
  pub captured_at: DateTime<Utc>,
}

impl WardPosition {
  fn new(ward_id: Uuid, position: Position) -> Self {
    Self {
      ward_id,
      latitude:    position.latitude,
      longitude:   position.longitude,
      captured_at: position.captured_at,
    }
  }
}

/// `GET /location/:ward_id`
pub async fn latest_one<S>(
  State(engine): State<Engine<S>>,
  Path(ward_id): Path<Uuid>,
) -> Result<Json<WardPosition>, ApiError>
where
  S: PresenceStore + 'static,
{
  let position = engine
    .latest_position(ward_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no position for ward {ward_id}")))?;
  Ok(Json(WardPosition::new(ward_id, position)))
}

/// `GET /location`
pub async fn latest_all<S>(
  State(engine): State<Engine<S>>,
) -> Result<Json<Vec<WardPosition>>, ApiError>
where
  S: PresenceStore + 'static,
{
  let positions = engine
    .latest_positions()
    .await?
    .into_iter()
    .map(|(ward_id, position)| WardPosition::new(ward_id, position))
    .collect();
  Ok(Json(positions))
}
