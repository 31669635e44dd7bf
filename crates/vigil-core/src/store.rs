//! The `PresenceStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `vigil-store-sqlite`).
//! Higher layers (`vigil-engine`, `vigil-api`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  case::{CaseStatus, CaseUpdateOutcome, MissingCase, NewCase, OpenOutcome},
  location::{LocationSample, Position},
  presence::PresenceState,
  ward::WardProfile,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`PresenceStore::list_cases`].
#[derive(Debug, Clone, Default)]
pub struct CaseQuery {
  /// Restrict to cases in this lifecycle status.
  pub status: Option<CaseStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the engine's persistence backend.
///
/// Location samples are append-only; presence state and the latest-position
/// projection are keyed upserts; the case registry's `open_case` must be an
/// atomic check-and-insert on `(ward_id, status = Missing)` so two racing
/// callers can never open duplicate cases for one ward.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (tokio with `axum`).
pub trait PresenceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Ward geofence snapshots ───────────────────────────────────────────

  /// Upsert a ward's geofence snapshot (the account-collaborator sync hook).
  fn put_ward(
    &self,
    profile: WardProfile,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Fetch a ward's geofence snapshot. Returns `None` for unknown wards.
  fn get_ward(
    &self,
    ward_id: Uuid,
  ) -> impl Future<Output = Result<Option<WardProfile>, Self::Error>> + Send + '_;

  /// Update home coordinates and radius for an existing ward. Returns
  /// `false` if the ward is unknown (no row updated).
  fn set_home(
    &self,
    ward_id: Uuid,
    lat: f64,
    lng: f64,
    radius_meters: f64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Location samples — append-only writes ─────────────────────────────

  /// Append a sample and update the latest-position projection
  /// unconditionally to this reading. The store does not reorder or reject
  /// stale timestamps.
  fn record_sample(
    &self,
    sample: LocationSample,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The most recently recorded position, or `None` if the ward has never
  /// reported.
  fn latest_position(
    &self,
    ward_id: Uuid,
  ) -> impl Future<Output = Result<Option<Position>, Self::Error>> + Send + '_;

  /// Latest positions of every ward that has ever reported — the snapshot a
  /// newly joined broadcast subscriber receives.
  fn latest_positions(
    &self,
  ) -> impl Future<Output = Result<Vec<(Uuid, Position)>, Self::Error>> + Send + '_;

  // ── Presence state ────────────────────────────────────────────────────

  fn get_presence(
    &self,
    ward_id: Uuid,
  ) -> impl Future<Output = Result<Option<PresenceState>, Self::Error>> + Send + '_;

  /// Upsert the presence record for its ward.
  fn put_presence(
    &self,
    state: &PresenceState,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All wards currently classified as outside — the stillness sweep's scan
  /// set.
  fn list_outside(
    &self,
  ) -> impl Future<Output = Result<Vec<PresenceState>, Self::Error>> + Send + '_;

  // ── Missing case registry ─────────────────────────────────────────────

  /// Atomic check-and-insert keyed on `(ward_id, status = Missing)`. If an
  /// open case already exists its id is returned instead; a previously
  /// `Found` case never blocks re-opening.
  fn open_case(
    &self,
    input: NewCase,
  ) -> impl Future<Output = Result<OpenOutcome, Self::Error>> + Send + '_;

  /// Transition a case to `Found`, keeping the existing position and notes
  /// where the caller supplies none.
  fn mark_found(
    &self,
    case_id: Uuid,
    lat: Option<f64>,
    lng: Option<f64>,
    notes: Option<String>,
  ) -> impl Future<Output = Result<CaseUpdateOutcome, Self::Error>> + Send + '_;

  /// Update the last-known coordinates of a case that is still `Missing`.
  fn update_case_position(
    &self,
    case_id: Uuid,
    lat: f64,
    lng: f64,
  ) -> impl Future<Output = Result<CaseUpdateOutcome, Self::Error>> + Send + '_;

  fn get_case(
    &self,
    case_id: Uuid,
  ) -> impl Future<Output = Result<Option<MissingCase>, Self::Error>> + Send + '_;

  /// Cases matching `query`, newest detection first.
  fn list_cases<'a>(
    &'a self,
    query: &'a CaseQuery,
  ) -> impl Future<Output = Result<Vec<MissingCase>, Self::Error>> + Send + 'a;
}
