//! Missing-person case lifecycle types.
//!
//! A case opens as `Missing` and transitions to `Found` exactly once, via an
//! explicit found operation. Cases are never hard-deleted; closed cases stay
//! behind for audit. The registry guarantees at most one `Missing` case per
//! ward at any time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a missing case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
  Missing,
  Found,
}

/// A tracked missing-person incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingCase {
  pub case_id:        Uuid,
  pub ward_id:        Uuid,
  pub detected_at:    DateTime<Utc>,
  pub last_latitude:  Option<f64>,
  pub last_longitude: Option<f64>,
  pub status:         CaseStatus,
  pub notes:          String,
  pub updated_at:     DateTime<Utc>,
}

/// Input to [`crate::store::PresenceStore::open_case`]. `case_id` and
/// `updated_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewCase {
  pub ward_id:        Uuid,
  pub detected_at:    DateTime<Utc>,
  pub last_latitude:  Option<f64>,
  pub last_longitude: Option<f64>,
  pub notes:          String,
}

// ─── Operation outcomes ──────────────────────────────────────────────────────

/// Result of the atomic check-and-insert on the case registry.
#[derive(Debug, Clone)]
pub enum OpenOutcome {
  Opened(MissingCase),
  /// A `Missing` case for this ward already exists; no new case was created.
  AlreadyOpen(Uuid),
}

/// Result of a mutation against an existing case (`mark_found`,
/// `update_position`).
#[derive(Debug, Clone)]
pub enum CaseUpdateOutcome {
  Updated(MissingCase),
  NotFound,
  /// The case exists but is already `Found`, so the mutation does not apply.
  AlreadyFound,
}
