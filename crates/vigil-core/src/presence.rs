//! Per-ward presence state and the home/outside transition table.
//!
//! The state machine is pure: [`PresenceState::apply_report`] takes a reading
//! plus the precomputed home distance and returns the alert to emit, if any.
//! Persistence and fan-out are the engine's job. There is exactly one place
//! that derives "outside" status; nothing else re-evaluates the geofence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo;

/// Seconds between repeated `StillOutside` alerts while a ward stays away.
pub const DEFAULT_ALERT_INTERVAL_SECS: i64 = 10;

/// Position jitter below this distance does not count as movement, so GPS
/// noise cannot keep resetting `last_moved_at` on a stationary ward.
pub const MOVEMENT_EPSILON_M: f64 = 1.0;

// ─── State ───────────────────────────────────────────────────────────────────

/// Mutable presence record, 1:1 with a ward. Created lazily on the ward's
/// first location report; updated exclusively by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceState {
  pub ward_id:             Uuid,
  pub is_outside:          bool,
  pub last_alert_at:       DateTime<Utc>,
  pub alert_interval_secs: i64,
  pub last_latitude:       f64,
  pub last_longitude:      f64,
  /// Last time the ward was observed more than [`MOVEMENT_EPSILON_M`] from
  /// its previous position. The stillness sweep keys off this.
  pub last_moved_at:       DateTime<Utc>,
}

/// The kind of alert a presence transition (or the sweep) produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
  LeftHome,
  StillOutside,
  ReturnedHome,
  MissingDetected,
}

impl PresenceState {
  /// Baseline state from a ward's first report. The first report never
  /// alerts, even if it is already outside the radius: it only establishes
  /// a known position and resets the throttle clock.
  pub fn new(ward_id: Uuid, lat: f64, lng: f64, now: DateTime<Utc>) -> Self {
    Self {
      ward_id,
      is_outside: false,
      last_alert_at: now,
      alert_interval_secs: DEFAULT_ALERT_INTERVAL_SECS,
      last_latitude: lat,
      last_longitude: lng,
      last_moved_at: now,
    }
  }

  /// Apply one location report.
  ///
  /// `distance` is the precomputed great-circle distance from the ward's
  /// home; `safe_radius` is the geofence radius. Returns the single alert
  /// this transition produces, or `None`.
  pub fn apply_report(
    &mut self,
    lat: f64,
    lng: f64,
    distance: f64,
    safe_radius: f64,
    now: DateTime<Utc>,
  ) -> Option<AlertKind> {
    let moved = geo::distance_meters(self.last_latitude, self.last_longitude, lat, lng)
      > MOVEMENT_EPSILON_M;
    if moved {
      self.last_moved_at = now;
    }
    self.last_latitude = lat;
    self.last_longitude = lng;

    let outside = distance > safe_radius;
    match (self.is_outside, outside) {
      // Home -> outside: always alert.
      (false, true) => {
        self.is_outside = true;
        self.last_alert_at = now;
        Some(AlertKind::LeftHome)
      }
      // Still outside: alert only once per throttle interval.
      (true, true) => {
        let elapsed = (now - self.last_alert_at).num_seconds();
        if elapsed >= self.alert_interval_secs {
          self.last_alert_at = now;
          Some(AlertKind::StillOutside)
        } else {
          None
        }
      }
      // Outside -> home: always alert, regardless of the throttle timer.
      (true, false) => {
        self.is_outside = false;
        self.last_alert_at = now;
        Some(AlertKind::ReturnedHome)
      }
      // Home, still home.
      (false, false) => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeDelta;

  use super::*;

  fn t0() -> DateTime<Utc> { "2025-06-01T09:00:00Z".parse().unwrap() }

  fn state_at_home() -> PresenceState {
    PresenceState::new(Uuid::new_v4(), 37.50, 127.00, t0())
  }

  #[test]
  fn leaving_the_radius_alerts_once() {
    let mut s = state_at_home();
    let alert = s.apply_report(37.501, 127.00, 111.0, 100.0, t0());
    assert_eq!(alert, Some(AlertKind::LeftHome));
    assert!(s.is_outside);
  }

  #[test]
  fn repeated_reports_within_interval_are_throttled() {
    let mut s = state_at_home();
    s.apply_report(37.501, 127.00, 111.0, 100.0, t0());

    let later = t0() + TimeDelta::seconds(5);
    let alert = s.apply_report(37.501, 127.00, 111.0, 100.0, later);
    assert_eq!(alert, None);
  }

  #[test]
  fn still_outside_alert_after_interval_elapses() {
    let mut s = state_at_home();
    s.apply_report(37.501, 127.00, 111.0, 100.0, t0());

    let later = t0() + TimeDelta::seconds(11);
    let alert = s.apply_report(37.501, 127.00, 111.0, 100.0, later);
    assert_eq!(alert, Some(AlertKind::StillOutside));
    assert_eq!(s.last_alert_at, later);
  }

  #[test]
  fn returning_home_alerts_despite_throttle() {
    let mut s = state_at_home();
    s.apply_report(37.501, 127.00, 111.0, 100.0, t0());

    // One second later, well inside the throttle window.
    let later = t0() + TimeDelta::seconds(1);
    let alert = s.apply_report(37.50, 127.00, 0.0, 100.0, later);
    assert_eq!(alert, Some(AlertKind::ReturnedHome));
    assert!(!s.is_outside);
  }

  #[test]
  fn staying_home_never_alerts() {
    let mut s = state_at_home();
    let alert = s.apply_report(37.5000001, 127.00, 0.01, 100.0, t0());
    assert_eq!(alert, None);
    assert!(!s.is_outside);
  }

  #[test]
  fn stationary_reports_do_not_advance_last_moved_at() {
    let mut s = state_at_home();
    let later = t0() + TimeDelta::seconds(600);
    s.apply_report(37.501, 127.00, 111.0, 100.0, later);
    assert_eq!(s.last_moved_at, later);

    // Same coordinates again, much later: still counts as stationary.
    let much_later = t0() + TimeDelta::seconds(4000);
    s.apply_report(37.501, 127.00, 111.0, 100.0, much_later);
    assert_eq!(s.last_moved_at, later);
  }

  #[test]
  fn real_movement_advances_last_moved_at() {
    let mut s = state_at_home();
    let later = t0() + TimeDelta::seconds(60);
    s.apply_report(37.502, 127.00, 222.0, 100.0, later);
    assert_eq!(s.last_moved_at, later);
  }
}
