//! Location samples — the immutable facts the engine reasons over.
//!
//! Samples are append-only; the engine never mutates or deletes one. The
//! store additionally keeps a per-ward "latest position" projection, updated
//! unconditionally to each incoming reading. Callers are responsible for
//! supplying monotonic timestamps; the store does not reorder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded GPS reading for a ward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSample {
  pub ward_id:     Uuid,
  pub latitude:    f64,
  pub longitude:   f64,
  pub captured_at: DateTime<Utc>,
}

/// A position with its capture time — the "latest position" projection entry
/// and the payload fanned out to broadcast subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub latitude:    f64,
  pub longitude:   f64,
  pub captured_at: DateTime<Utc>,
}

impl From<&LocationSample> for Position {
  fn from(s: &LocationSample) -> Self {
    Self {
      latitude:    s.latitude,
      longitude:   s.longitude,
      captured_at: s.captured_at,
    }
  }
}
