//! [`Engine`] — the orchestrator behind every mutating operation.
//!
//! Concurrency discipline: all reads and writes of one ward's presence state
//! happen under that ward's entry in a keyed async mutex table, so two
//! concurrent reports for the same ward (client retries) cannot interleave
//! and lose a transition or double an alert. Wards never contend with each
//! other. The case registry's check-then-open atomicity is the store's
//! responsibility (see [`PresenceStore::open_case`]).

use std::{
  collections::HashMap,
  sync::{Arc, Mutex as StdMutex},
  time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use vigil_core::{
  Error, Result,
  alert::{AlertEvent, AlertSink},
  case::{CaseUpdateOutcome, MissingCase, NewCase, OpenOutcome},
  geo,
  location::{LocationSample, Position},
  presence::{AlertKind, PresenceState},
  store::PresenceStore,
  ward::WardProfile,
};

use crate::hub::{BroadcastHub, HubEvent};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Engine tuning knobs. The source system never settled on fixed values for
/// the sweep timing, so all three are configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Throttle interval seeded into newly created presence state.
  pub default_alert_interval_secs: i64,
  /// How long a ward must sit still outside the geofence before the sweep
  /// opens a missing case.
  pub stillness_threshold_secs:    i64,
  /// Period of the stillness sweep.
  pub sweep_period:                Duration,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      default_alert_interval_secs: 10,
      stillness_threshold_secs:    3600,
      sweep_period:                Duration::from_secs(300),
    }
  }
}

// ─── Report outcome ──────────────────────────────────────────────────────────

/// What a location report resolved to; returned to the ingestion caller.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Report {
  pub is_outside:      bool,
  pub distance_meters: f64,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The presence & missing-detection engine over a [`PresenceStore`] backend.
///
/// Cloning is cheap; clones share the store, sink, hub, and lock table.
pub struct Engine<S> {
  store:      Arc<S>,
  sink:       Arc<dyn AlertSink>,
  hub:        BroadcastHub,
  config:     EngineConfig,
  ward_locks: Arc<StdMutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl<S> Clone for Engine<S> {
  fn clone(&self) -> Self {
    Self {
      store:      self.store.clone(),
      sink:       self.sink.clone(),
      hub:        self.hub.clone(),
      config:     self.config.clone(),
      ward_locks: self.ward_locks.clone(),
    }
  }
}

impl<S: PresenceStore> Engine<S> {
  pub fn new(store: Arc<S>, sink: Arc<dyn AlertSink>, config: EngineConfig) -> Self {
    Self {
      store,
      sink,
      hub: BroadcastHub::new(),
      config,
      ward_locks: Arc::new(StdMutex::new(HashMap::new())),
    }
  }

  pub fn config(&self) -> &EngineConfig { &self.config }

  pub(crate) fn store(&self) -> &S { &self.store }

  /// The per-ward serialisation point. Entries are created lazily and kept
  /// for the ward's lifetime (wards number in the thousands, not millions).
  fn ward_lock(&self, ward_id: Uuid) -> Arc<AsyncMutex<()>> {
    self
      .ward_locks
      .lock()
      .expect("lock table poisoned")
      .entry(ward_id)
      .or_default()
      .clone()
  }

  fn ensure_coordinates(lat: f64, lng: f64) -> Result<()> {
    if geo::coordinates_valid(lat, lng) {
      Ok(())
    } else {
      Err(Error::InvalidCoordinates { lat, lng })
    }
  }

  // ── Ward geofence snapshots ───────────────────────────────────────────────

  /// Collaborator sync hook: accept a refreshed geofence snapshot from the
  /// account system.
  pub async fn sync_ward(&self, profile: WardProfile) -> Result<()> {
    Self::ensure_coordinates(profile.home_latitude, profile.home_longitude)?;
    self.store.put_ward(profile).await.map_err(Error::store)
  }

  /// Update the home geofence for an existing ward.
  pub async fn register_home(
    &self,
    ward_id: Uuid,
    lat: f64,
    lng: f64,
    radius_meters: f64,
  ) -> Result<()> {
    Self::ensure_coordinates(lat, lng)?;
    let updated = self
      .store
      .set_home(ward_id, lat, lng, radius_meters)
      .await
      .map_err(Error::store)?;
    if updated {
      Ok(())
    } else {
      Err(Error::WardNotFound(ward_id))
    }
  }

  // ── Location ingestion ────────────────────────────────────────────────────

  /// Primary ingestion entry point: record one location report, run the
  /// presence transition, emit at most one alert, and fan the raw position
  /// out to subscribers.
  ///
  /// Store failures fail this single report; retry policy belongs to the
  /// transport layer.
  pub async fn report_location(
    &self,
    ward_id: Uuid,
    lat: f64,
    lng: f64,
    at: DateTime<Utc>,
  ) -> Result<Report> {
    Self::ensure_coordinates(lat, lng)?;

    let lock = self.ward_lock(ward_id);
    let _guard = lock.lock().await;

    let ward = self
      .store
      .get_ward(ward_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::WardNotFound(ward_id))?;

    let distance =
      geo::distance_meters(lat, lng, ward.home_latitude, ward.home_longitude);

    self
      .store
      .record_sample(LocationSample {
        ward_id,
        latitude: lat,
        longitude: lng,
        captured_at: at,
      })
      .await
      .map_err(Error::store)?;

    let (state, alert) = match self.store.get_presence(ward_id).await.map_err(Error::store)? {
      // First report: establish a baseline, never alert.
      None => {
        let mut state = PresenceState::new(ward_id, lat, lng, at);
        state.alert_interval_secs = self.config.default_alert_interval_secs;
        (state, None)
      }
      Some(mut state) => {
        let alert = state.apply_report(lat, lng, distance, ward.safe_radius_meters, at);
        (state, alert)
      }
    };

    self.store.put_presence(&state).await.map_err(Error::store)?;

    if let Some(kind) = alert {
      let event = AlertEvent {
        kind,
        ward_id,
        at,
        latitude: lat,
        longitude: lng,
        message: alert_message(kind, &ward),
      };
      self.sink.deliver(&event);
      self.hub.publish_alert(&event);
    }

    // The raw position is always fanned out, alert or not.
    self.hub.publish_location(
      ward_id,
      Position { latitude: lat, longitude: lng, captured_at: at },
      ward.display_name.clone(),
    );

    Ok(Report { is_outside: state.is_outside, distance_meters: distance })
  }

  /// The latest-position projection for one ward.
  pub async fn latest_position(&self, ward_id: Uuid) -> Result<Option<Position>> {
    self.store.latest_position(ward_id).await.map_err(Error::store)
  }

  /// Latest positions of every ward that has reported.
  pub async fn latest_positions(&self) -> Result<Vec<(Uuid, Position)>> {
    self.store.latest_positions().await.map_err(Error::store)
  }

  // ── Missing case lifecycle ────────────────────────────────────────────────

  /// Open a missing case for `ward_id`, deduplicated against any case that
  /// is already `Missing`. Shared by the stillness sweep and the external
  /// emergency trigger, so both get the same dedup guarantee.
  pub async fn open_missing_case(
    &self,
    ward_id: Uuid,
    position: Option<(f64, f64)>,
    note: Option<String>,
    now: DateTime<Utc>,
  ) -> Result<MissingCase> {
    if let Some((lat, lng)) = position {
      Self::ensure_coordinates(lat, lng)?;
    }

    let ward = self
      .store
      .get_ward(ward_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::WardNotFound(ward_id))?;

    // Fall back to the last position the engine knows about.
    let (last_lat, last_lng) = match position {
      Some((lat, lng)) => (Some(lat), Some(lng)),
      None => match self.store.get_presence(ward_id).await.map_err(Error::store)? {
        Some(p) => (Some(p.last_latitude), Some(p.last_longitude)),
        None => match self.latest_position(ward_id).await? {
          Some(p) => (Some(p.latitude), Some(p.longitude)),
          None => (None, None),
        },
      },
    };

    let notes =
      note.unwrap_or_else(|| "automatically opened from emergency report".to_string());

    let outcome = self
      .store
      .open_case(NewCase {
        ward_id,
        detected_at: now,
        last_latitude: last_lat,
        last_longitude: last_lng,
        notes,
      })
      .await
      .map_err(Error::store)?;

    match outcome {
      OpenOutcome::AlreadyOpen(case_id) => Err(Error::CaseAlreadyOpen { ward_id, case_id }),
      OpenOutcome::Opened(case) => {
        let event = AlertEvent {
          kind:      AlertKind::MissingDetected,
          ward_id,
          at:        now,
          latitude:  last_lat.unwrap_or(ward.home_latitude),
          longitude: last_lng.unwrap_or(ward.home_longitude),
          message:   alert_message(AlertKind::MissingDetected, &ward),
        };
        self.sink.deliver(&event);
        self.hub.publish_alert(&event);
        Ok(case)
      }
    }
  }

  /// Close a case. Position and notes, where supplied, replace the last
  /// known values; otherwise the existing ones stand.
  pub async fn mark_case_found(
    &self,
    case_id: Uuid,
    position: Option<(f64, f64)>,
    note: Option<String>,
  ) -> Result<MissingCase> {
    if let Some((lat, lng)) = position {
      Self::ensure_coordinates(lat, lng)?;
    }
    let (lat, lng) = match position {
      Some((lat, lng)) => (Some(lat), Some(lng)),
      None => (None, None),
    };

    let outcome = self
      .store
      .mark_found(case_id, lat, lng, note)
      .await
      .map_err(Error::store)?;

    match outcome {
      CaseUpdateOutcome::Updated(case) => Ok(case),
      CaseUpdateOutcome::NotFound => Err(Error::CaseNotFound(case_id)),
      CaseUpdateOutcome::AlreadyFound => Err(Error::CaseAlreadyFound(case_id)),
    }
  }

  /// Live position tracking for an active case. Also refreshes the ward's
  /// presence coordinates so the sweep and the case stay in step.
  pub async fn update_case_position(
    &self,
    case_id: Uuid,
    lat: f64,
    lng: f64,
    now: DateTime<Utc>,
  ) -> Result<MissingCase> {
    Self::ensure_coordinates(lat, lng)?;

    let outcome = self
      .store
      .update_case_position(case_id, lat, lng)
      .await
      .map_err(Error::store)?;

    let case = match outcome {
      CaseUpdateOutcome::Updated(case) => case,
      CaseUpdateOutcome::NotFound => return Err(Error::CaseNotFound(case_id)),
      CaseUpdateOutcome::AlreadyFound => return Err(Error::CaseAlreadyFound(case_id)),
    };

    let lock = self.ward_lock(case.ward_id);
    let _guard = lock.lock().await;
    if let Some(mut presence) =
      self.store.get_presence(case.ward_id).await.map_err(Error::store)?
    {
      presence.last_latitude = lat;
      presence.last_longitude = lng;
      presence.last_moved_at = now;
      self.store.put_presence(&presence).await.map_err(Error::store)?;
    }

    Ok(case)
  }

  pub async fn get_case(&self, case_id: Uuid) -> Result<Option<MissingCase>> {
    self.store.get_case(case_id).await.map_err(Error::store)
  }

  pub async fn list_cases(
    &self,
    query: &vigil_core::store::CaseQuery,
  ) -> Result<Vec<MissingCase>> {
    self.store.list_cases(query).await.map_err(Error::store)
  }

  // ── Broadcast subscriptions ───────────────────────────────────────────────

  /// Subscribe an observer to the broadcast hub. The returned stream starts
  /// with a snapshot of every reporting ward's latest position.
  pub async fn subscribe(
    &self,
    observer_id: Uuid,
  ) -> Result<tokio::sync::mpsc::UnboundedReceiver<HubEvent>> {
    let snapshot = self.latest_positions().await?;
    Ok(self.hub.subscribe(observer_id, snapshot))
  }

  pub fn unsubscribe(&self, observer_id: Uuid) {
    self.hub.unsubscribe(observer_id);
  }

  pub fn hub(&self) -> &BroadcastHub { &self.hub }
}

/// Guardian-facing notification text for each alert kind.
fn alert_message(kind: AlertKind, ward: &WardProfile) -> String {
  let name = ward.name();
  match kind {
    AlertKind::LeftHome => format!("{name} left home"),
    AlertKind::StillOutside => format!("{name} is still outside"),
    AlertKind::ReturnedHome => format!("{name} returned home"),
    AlertKind::MissingDetected => {
      format!("{name} has stopped moving outside the safe zone")
    }
  }
}
