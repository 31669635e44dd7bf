//! Ward geofence snapshot — owned by the external account system.
//!
//! The engine only reads these fields. It never creates or deletes a ward;
//! the account collaborator pushes snapshots through the sync hook and the
//! engine treats them as read-only data refreshed per report.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default safe radius in meters when the guardian has not chosen one.
pub const DEFAULT_SAFE_RADIUS_M: f64 = 100.0;

/// The home geofence for one ward: a circle around the registered home
/// coordinates. A report farther than `safe_radius_meters` from home
/// classifies the ward as outside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardProfile {
  pub ward_id:           Uuid,
  /// Human-readable name used in alert and broadcast payloads.
  pub display_name:      Option<String>,
  pub home_latitude:     f64,
  pub home_longitude:    f64,
  pub safe_radius_meters: f64,
}

impl WardProfile {
  /// The name shown to guardians; falls back to the ward id.
  pub fn name(&self) -> String {
    self
      .display_name
      .clone()
      .unwrap_or_else(|| self.ward_id.to_string())
  }
}
