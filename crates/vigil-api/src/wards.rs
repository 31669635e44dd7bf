//! Handlers for `/wards` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `PUT`  | `/wards/:id` | Geofence snapshot upsert (account-system sync hook) |
//! | `POST` | `/wards/:id/home` | Re-register home for an existing ward; 404 if unknown |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;
use vigil_core::{
  store::PresenceStore,
  ward::{DEFAULT_SAFE_RADIUS_M, WardProfile},
};
use vigil_engine::Engine;

use crate::error::ApiError;

// ─── Sync ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SyncBody {
  pub display_name:       Option<String>,
  pub home_latitude:      f64,
  pub home_longitude:     f64,
  pub safe_radius_meters: Option<f64>,
}

/// `PUT /wards/:id` — upsert the ward's geofence snapshot.
pub async fn sync<S>(
  State(engine): State<Engine<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<SyncBody>,
) -> Result<StatusCode, ApiError>
where
  S: PresenceStore + 'static,
{
  engine
    .sync_ward(WardProfile {
      ward_id:            id,
      display_name:       body.display_name,
      home_latitude:      body.home_latitude,
      home_longitude:     body.home_longitude,
      safe_radius_meters: body.safe_radius_meters.unwrap_or(DEFAULT_SAFE_RADIUS_M),
    })
    .await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Register home ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HomeBody {
  pub latitude:      f64,
  pub longitude:     f64,
  pub radius_meters: Option<f64>,
}

/// `POST /wards/:id/home` — update the home geofence. 404 for unknown wards.
pub async fn register_home<S>(
  State(engine): State<Engine<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<HomeBody>,
) -> Result<StatusCode, ApiError>
where
  S: PresenceStore + 'static,
{
  engine
    .register_home(
      id,
      body.latitude,
      body.longitude,
      body.radius_meters.unwrap_or(DEFAULT_SAFE_RADIUS_M),
    )
    .await?;
  Ok(StatusCode::NO_CONTENT)
}
