//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Booleans are SQLite integers.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use vigil_core::{
  case::{CaseStatus, MissingCase},
  location::Position,
  presence::PresenceState,
  ward::WardProfile,
};

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── CaseStatus ──────────────────────────────────────────────────────────────

pub fn encode_case_status(s: CaseStatus) -> &'static str {
  match s {
    CaseStatus::Missing => "missing",
    CaseStatus::Found => "found",
  }
}

pub fn decode_case_status(s: &str) -> Result<CaseStatus> {
  match s {
    "missing" => Ok(CaseStatus::Missing),
    "found" => Ok(CaseStatus::Found),
    other => Err(Error::UnknownCaseStatus(other.to_string())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `wards` row.
pub struct RawWard {
  pub ward_id:       String,
  pub display_name:  Option<String>,
  pub home_lat:      f64,
  pub home_lng:      f64,
  pub safe_radius_m: f64,
}

impl RawWard {
  pub fn into_profile(self) -> Result<WardProfile> {
    Ok(WardProfile {
      ward_id:            decode_uuid(&self.ward_id)?,
      display_name:       self.display_name,
      home_latitude:      self.home_lat,
      home_longitude:     self.home_lng,
      safe_radius_meters: self.safe_radius_m,
    })
  }
}

/// Raw strings read directly from a `latest_positions` row.
pub struct RawPosition {
  pub lat:         f64,
  pub lng:         f64,
  pub captured_at: String,
}

impl RawPosition {
  pub fn into_position(self) -> Result<Position> {
    Ok(Position {
      latitude:    self.lat,
      longitude:   self.lng,
      captured_at: decode_dt(&self.captured_at)?,
    })
  }
}

/// Raw strings read directly from a `ward_presence` row.
pub struct RawPresence {
  pub ward_id:             String,
  pub is_outside:          bool,
  pub last_alert_at:       String,
  pub alert_interval_secs: i64,
  pub last_lat:            f64,
  pub last_lng:            f64,
  pub last_moved_at:       String,
}

impl RawPresence {
  pub fn into_presence(self) -> Result<PresenceState> {
    Ok(PresenceState {
      ward_id:             decode_uuid(&self.ward_id)?,
      is_outside:          self.is_outside,
      last_alert_at:       decode_dt(&self.last_alert_at)?,
      alert_interval_secs: self.alert_interval_secs,
      last_latitude:       self.last_lat,
      last_longitude:      self.last_lng,
      last_moved_at:       decode_dt(&self.last_moved_at)?,
    })
  }
}

/// Raw strings read directly from a `missing_cases` row.
pub struct RawCase {
  pub case_id:     String,
  pub ward_id:     String,
  pub detected_at: String,
  pub last_lat:    Option<f64>,
  pub last_lng:    Option<f64>,
  pub status:      String,
  pub notes:       String,
  pub updated_at:  String,
}

impl RawCase {
  pub fn into_case(self) -> Result<MissingCase> {
    Ok(MissingCase {
      case_id:        decode_uuid(&self.case_id)?,
      ward_id:        decode_uuid(&self.ward_id)?,
      detected_at:    decode_dt(&self.detected_at)?,
      last_latitude:  self.last_lat,
      last_longitude: self.last_lng,
      status:         decode_case_status(&self.status)?,
      notes:          self.notes,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}
