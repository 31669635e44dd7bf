//! [`SqliteStore`] — the SQLite implementation of [`PresenceStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use vigil_core::{
  case::{CaseStatus, CaseUpdateOutcome, MissingCase, NewCase, OpenOutcome},
  location::{LocationSample, Position},
  presence::PresenceState,
  store::{CaseQuery, PresenceStore},
  ward::WardProfile,
};

use crate::{
  encode::{
    RawCase, RawPosition, RawPresence, RawWard, decode_uuid, encode_case_status,
    encode_dt, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

const CASE_COLUMNS: &str =
  "case_id, ward_id, detected_at, last_lat, last_lng, status, notes, updated_at";

fn case_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCase> {
  Ok(RawCase {
    case_id:     row.get(0)?,
    ward_id:     row.get(1)?,
    detected_at: row.get(2)?,
    last_lat:    row.get(3)?,
    last_lng:    row.get(4)?,
    status:      row.get(5)?,
    notes:       row.get(6)?,
    updated_at:  row.get(7)?,
  })
}

fn presence_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPresence> {
  Ok(RawPresence {
    ward_id:             row.get(0)?,
    is_outside:          row.get(1)?,
    last_alert_at:       row.get(2)?,
    alert_interval_secs: row.get(3)?,
    last_lat:            row.get(4)?,
    last_lng:            row.get(5)?,
    last_moved_at:       row.get(6)?,
  })
}

/// What a case mutation found inside the connection closure, before raw rows
/// are decoded back into domain types.
enum RawCaseUpdate {
  Row(RawCase),
  NoSuchCase,
  AlreadyClosed,
}

impl RawCaseUpdate {
  fn into_outcome(self) -> Result<CaseUpdateOutcome> {
    match self {
      Self::Row(raw) => Ok(CaseUpdateOutcome::Updated(raw.into_case()?)),
      Self::NoSuchCase => Ok(CaseUpdateOutcome::NotFound),
      Self::AlreadyClosed => Ok(CaseUpdateOutcome::AlreadyFound),
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Vigil presence store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── PresenceStore impl ──────────────────────────────────────────────────────

impl PresenceStore for SqliteStore {
  type Error = Error;

  // ── Ward geofence snapshots ───────────────────────────────────────────────

  async fn put_ward(&self, profile: WardProfile) -> Result<()> {
    let id_str = encode_uuid(profile.ward_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO wards (ward_id, display_name, home_lat, home_lng, safe_radius_m)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(ward_id) DO UPDATE SET
             display_name  = excluded.display_name,
             home_lat      = excluded.home_lat,
             home_lng      = excluded.home_lng,
             safe_radius_m = excluded.safe_radius_m",
          rusqlite::params![
            id_str,
            profile.display_name,
            profile.home_latitude,
            profile.home_longitude,
            profile.safe_radius_meters,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_ward(&self, ward_id: Uuid) -> Result<Option<WardProfile>> {
    let id_str = encode_uuid(ward_id);

    let raw: Option<RawWard> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT ward_id, display_name, home_lat, home_lng, safe_radius_m
             FROM wards WHERE ward_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawWard {
                ward_id:       row.get(0)?,
                display_name:  row.get(1)?,
                home_lat:      row.get(2)?,
                home_lng:      row.get(3)?,
                safe_radius_m: row.get(4)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawWard::into_profile).transpose()
  }

  async fn set_home(
    &self,
    ward_id: Uuid,
    lat: f64,
    lng: f64,
    radius_meters: f64,
  ) -> Result<bool> {
    let id_str = encode_uuid(ward_id);
    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE wards SET home_lat = ?2, home_lng = ?3, safe_radius_m = ?4
           WHERE ward_id = ?1",
          rusqlite::params![id_str, lat, lng, radius_meters],
        )?;
        Ok(n)
      })
      .await?;
    Ok(changed > 0)
  }

  // ── Location samples — append-only writes ─────────────────────────────────

  async fn record_sample(&self, sample: LocationSample) -> Result<()> {
    let id_str = encode_uuid(sample.ward_id);
    let at_str = encode_dt(sample.captured_at);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO location_samples (ward_id, lat, lng, captured_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, sample.latitude, sample.longitude, at_str],
        )?;
        conn.execute(
          "INSERT INTO latest_positions (ward_id, lat, lng, captured_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(ward_id) DO UPDATE SET
             lat = excluded.lat, lng = excluded.lng,
             captured_at = excluded.captured_at",
          rusqlite::params![id_str, sample.latitude, sample.longitude, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn latest_position(&self, ward_id: Uuid) -> Result<Option<Position>> {
    let id_str = encode_uuid(ward_id);

    let raw: Option<RawPosition> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT lat, lng, captured_at FROM latest_positions WHERE ward_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawPosition {
                lat:         row.get(0)?,
                lng:         row.get(1)?,
                captured_at: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPosition::into_position).transpose()
  }

  async fn latest_positions(&self) -> Result<Vec<(Uuid, Position)>> {
    let raws: Vec<(String, RawPosition)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT ward_id, lat, lng, captured_at FROM latest_positions")?;
        let rows = stmt
          .query_map([], |row| {
            Ok((
              row.get::<_, String>(0)?,
              RawPosition {
                lat:         row.get(1)?,
                lng:         row.get(2)?,
                captured_at: row.get(3)?,
              },
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(id, raw)| Ok((decode_uuid(&id)?, raw.into_position()?)))
      .collect()
  }

  // ── Presence state ────────────────────────────────────────────────────────

  async fn get_presence(&self, ward_id: Uuid) -> Result<Option<PresenceState>> {
    let id_str = encode_uuid(ward_id);

    let raw: Option<RawPresence> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT ward_id, is_outside, last_alert_at, alert_interval_secs,
                    last_lat, last_lng, last_moved_at
             FROM ward_presence WHERE ward_id = ?1",
            rusqlite::params![id_str],
            presence_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPresence::into_presence).transpose()
  }

  fn put_presence(
    &self,
    state: &PresenceState,
  ) -> impl std::future::Future<Output = Result<()>> + Send + '_ {
    let id_str       = encode_uuid(state.ward_id);
    let alert_at_str = encode_dt(state.last_alert_at);
    let moved_at_str = encode_dt(state.last_moved_at);
    let is_outside   = state.is_outside;
    let interval     = state.alert_interval_secs;
    let lat          = state.last_latitude;
    let lng          = state.last_longitude;

    async move {
      self
        .conn
        .call(move |conn| {
          conn.execute(
            "INSERT INTO ward_presence (ward_id, is_outside, last_alert_at,
               alert_interval_secs, last_lat, last_lng, last_moved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(ward_id) DO UPDATE SET
               is_outside          = excluded.is_outside,
               last_alert_at       = excluded.last_alert_at,
               alert_interval_secs = excluded.alert_interval_secs,
               last_lat            = excluded.last_lat,
               last_lng            = excluded.last_lng,
               last_moved_at       = excluded.last_moved_at",
            rusqlite::params![
              id_str, is_outside, alert_at_str, interval, lat, lng, moved_at_str
            ],
          )?;
          Ok(())
        })
        .await?;
      Ok(())
    }
  }

  async fn list_outside(&self) -> Result<Vec<PresenceState>> {
    let raws: Vec<RawPresence> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT ward_id, is_outside, last_alert_at, alert_interval_secs,
                  last_lat, last_lng, last_moved_at
           FROM ward_presence WHERE is_outside = 1",
        )?;
        let rows = stmt
          .query_map([], presence_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPresence::into_presence).collect()
  }

  // ── Missing case registry ─────────────────────────────────────────────────

  async fn open_case(&self, input: NewCase) -> Result<OpenOutcome> {
    let case = MissingCase {
      case_id:        Uuid::new_v4(),
      ward_id:        input.ward_id,
      detected_at:    input.detected_at,
      last_latitude:  input.last_latitude,
      last_longitude: input.last_longitude,
      status:         CaseStatus::Missing,
      notes:          input.notes,
      updated_at:     input.detected_at,
    };

    let case_id_str = encode_uuid(case.case_id);
    let ward_id_str = encode_uuid(case.ward_id);
    let at_str      = encode_dt(case.detected_at);
    let lat         = case.last_latitude;
    let lng         = case.last_longitude;
    let notes       = case.notes.clone();

    // The existence check and the insert run in one closure on the single
    // connection thread, so two racing open_case calls cannot both insert.
    let existing: Option<String> = self
      .conn
      .call(move |conn| {
        let open: Option<String> = conn
          .query_row(
            "SELECT case_id FROM missing_cases
             WHERE ward_id = ?1 AND status = 'missing'",
            rusqlite::params![ward_id_str],
            |r| r.get(0),
          )
          .optional()?;

        if open.is_some() {
          return Ok(open);
        }

        conn.execute(
          "INSERT INTO missing_cases
             (case_id, ward_id, detected_at, last_lat, last_lng, status, notes, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, 'missing', ?6, ?3)",
          rusqlite::params![case_id_str, ward_id_str, at_str, lat, lng, notes],
        )?;
        Ok(None)
      })
      .await?;

    match existing {
      Some(id) => Ok(OpenOutcome::AlreadyOpen(decode_uuid(&id)?)),
      None => Ok(OpenOutcome::Opened(case)),
    }
  }

  async fn mark_found(
    &self,
    case_id: Uuid,
    lat: Option<f64>,
    lng: Option<f64>,
    notes: Option<String>,
  ) -> Result<CaseUpdateOutcome> {
    let id_str = encode_uuid(case_id);
    let now_str = encode_dt(Utc::now());

    let raw: RawCaseUpdate = self
      .conn
      .call(move |conn| {
        let status: Option<String> = conn
          .query_row(
            "SELECT status FROM missing_cases WHERE case_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;

        match status.as_deref() {
          None => Ok(RawCaseUpdate::NoSuchCase),
          Some("found") => Ok(RawCaseUpdate::AlreadyClosed),
          Some(_) => {
            conn.execute(
              "UPDATE missing_cases
               SET status     = 'found',
                   last_lat   = COALESCE(?2, last_lat),
                   last_lng   = COALESCE(?3, last_lng),
                   notes      = COALESCE(?4, notes),
                   updated_at = ?5
               WHERE case_id = ?1",
              rusqlite::params![id_str, lat, lng, notes, now_str],
            )?;
            let row = conn.query_row(
              &format!("SELECT {CASE_COLUMNS} FROM missing_cases WHERE case_id = ?1"),
              rusqlite::params![id_str],
              case_from_row,
            )?;
            Ok(RawCaseUpdate::Row(row))
          }
        }
      })
      .await?;

    raw.into_outcome()
  }

  async fn update_case_position(
    &self,
    case_id: Uuid,
    lat: f64,
    lng: f64,
  ) -> Result<CaseUpdateOutcome> {
    let id_str = encode_uuid(case_id);
    let now_str = encode_dt(Utc::now());

    let raw: RawCaseUpdate = self
      .conn
      .call(move |conn| {
        let status: Option<String> = conn
          .query_row(
            "SELECT status FROM missing_cases WHERE case_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;

        match status.as_deref() {
          None => Ok(RawCaseUpdate::NoSuchCase),
          Some("found") => Ok(RawCaseUpdate::AlreadyClosed),
          Some(_) => {
            conn.execute(
              "UPDATE missing_cases
               SET last_lat = ?2, last_lng = ?3, updated_at = ?4
               WHERE case_id = ?1",
              rusqlite::params![id_str, lat, lng, now_str],
            )?;
            let row = conn.query_row(
              &format!("SELECT {CASE_COLUMNS} FROM missing_cases WHERE case_id = ?1"),
              rusqlite::params![id_str],
              case_from_row,
            )?;
            Ok(RawCaseUpdate::Row(row))
          }
        }
      })
      .await?;

    raw.into_outcome()
  }

  async fn get_case(&self, case_id: Uuid) -> Result<Option<MissingCase>> {
    let id_str = encode_uuid(case_id);

    let raw: Option<RawCase> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CASE_COLUMNS} FROM missing_cases WHERE case_id = ?1"),
            rusqlite::params![id_str],
            case_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCase::into_case).transpose()
  }

  async fn list_cases(&self, query: &CaseQuery) -> Result<Vec<MissingCase>> {
    let status_str = query.status.map(encode_case_status).map(str::to_owned);
    let limit  = query.limit.unwrap_or(50) as i64;
    let offset = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawCase> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(s) = status_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {CASE_COLUMNS} FROM missing_cases WHERE status = ?1
             ORDER BY detected_at DESC LIMIT ?2 OFFSET ?3"
          ))?;
          stmt
            .query_map(rusqlite::params![s, limit, offset], case_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {CASE_COLUMNS} FROM missing_cases
             ORDER BY detected_at DESC LIMIT ?1 OFFSET ?2"
          ))?;
          stmt
            .query_map(rusqlite::params![limit, offset], case_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCase::into_case).collect()
  }
}
