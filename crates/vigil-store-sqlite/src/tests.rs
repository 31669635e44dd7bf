//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;
use vigil_core::{
  case::{CaseStatus, CaseUpdateOutcome, NewCase, OpenOutcome},
  location::LocationSample,
  presence::PresenceState,
  store::{CaseQuery, PresenceStore},
  ward::WardProfile,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn t0() -> DateTime<Utc> { "2025-06-01T09:00:00Z".parse().unwrap() }

fn profile(ward_id: Uuid) -> WardProfile {
  WardProfile {
    ward_id,
    display_name:       Some("Alice".into()),
    home_latitude:      37.50,
    home_longitude:     127.00,
    safe_radius_meters: 100.0,
  }
}

fn sample(ward_id: Uuid, lat: f64, lng: f64, at: DateTime<Utc>) -> LocationSample {
  LocationSample { ward_id, latitude: lat, longitude: lng, captured_at: at }
}

fn new_case(ward_id: Uuid, at: DateTime<Utc>) -> NewCase {
  NewCase {
    ward_id,
    detected_at:    at,
    last_latitude:  Some(37.501),
    last_longitude: Some(127.00),
    notes:          "no movement for 1h".into(),
  }
}

async fn seeded_ward(s: &SqliteStore) -> Uuid {
  let id = Uuid::new_v4();
  s.put_ward(profile(id)).await.unwrap();
  id
}

// ─── Wards ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_and_get_ward() {
  let s = store().await;
  let id = seeded_ward(&s).await;

  let fetched = s.get_ward(id).await.unwrap().unwrap();
  assert_eq!(fetched.ward_id, id);
  assert_eq!(fetched.display_name.as_deref(), Some("Alice"));
  assert_eq!(fetched.safe_radius_meters, 100.0);
}

#[tokio::test]
async fn get_ward_missing_returns_none() {
  let s = store().await;
  assert!(s.get_ward(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn put_ward_is_an_upsert() {
  let s = store().await;
  let id = seeded_ward(&s).await;

  let mut updated = profile(id);
  updated.safe_radius_meters = 250.0;
  s.put_ward(updated).await.unwrap();

  let fetched = s.get_ward(id).await.unwrap().unwrap();
  assert_eq!(fetched.safe_radius_meters, 250.0);
}

#[tokio::test]
async fn set_home_updates_existing_ward() {
  let s = store().await;
  let id = seeded_ward(&s).await;

  let updated = s.set_home(id, 36.0, 128.0, 150.0).await.unwrap();
  assert!(updated);

  let fetched = s.get_ward(id).await.unwrap().unwrap();
  assert_eq!(fetched.home_latitude, 36.0);
  assert_eq!(fetched.safe_radius_meters, 150.0);
}

#[tokio::test]
async fn set_home_unknown_ward_returns_false() {
  let s = store().await;
  assert!(!s.set_home(Uuid::new_v4(), 36.0, 128.0, 150.0).await.unwrap());
}

// ─── Location samples ────────────────────────────────────────────────────────

#[tokio::test]
async fn latest_position_absent_before_first_report() {
  let s = store().await;
  let id = seeded_ward(&s).await;
  assert!(s.latest_position(id).await.unwrap().is_none());
}

#[tokio::test]
async fn record_sample_updates_latest_position() {
  let s = store().await;
  let id = seeded_ward(&s).await;

  s.record_sample(sample(id, 37.50, 127.00, t0())).await.unwrap();
  s.record_sample(sample(id, 37.51, 127.01, t0() + TimeDelta::seconds(60)))
    .await
    .unwrap();

  let pos = s.latest_position(id).await.unwrap().unwrap();
  assert_eq!(pos.latitude, 37.51);
  assert_eq!(pos.captured_at, t0() + TimeDelta::seconds(60));
}

#[tokio::test]
async fn latest_position_takes_most_recent_write_not_timestamp() {
  // The projection tracks write order; monotonic timestamps are the
  // caller's responsibility.
  let s = store().await;
  let id = seeded_ward(&s).await;

  s.record_sample(sample(id, 37.51, 127.01, t0() + TimeDelta::seconds(60)))
    .await
    .unwrap();
  s.record_sample(sample(id, 37.50, 127.00, t0())).await.unwrap();

  let pos = s.latest_position(id).await.unwrap().unwrap();
  assert_eq!(pos.latitude, 37.50);
  assert_eq!(pos.captured_at, t0());
}

#[tokio::test]
async fn latest_positions_lists_every_reporting_ward() {
  let s = store().await;
  let a = seeded_ward(&s).await;
  let b = seeded_ward(&s).await;
  seeded_ward(&s).await; // never reports

  s.record_sample(sample(a, 37.50, 127.00, t0())).await.unwrap();
  s.record_sample(sample(b, 35.00, 129.00, t0())).await.unwrap();

  let all = s.latest_positions().await.unwrap();
  assert_eq!(all.len(), 2);
  assert!(all.iter().any(|(id, _)| *id == a));
  assert!(all.iter().any(|(id, _)| *id == b));
}

// ─── Presence state ──────────────────────────────────────────────────────────

#[tokio::test]
async fn presence_round_trip() {
  let s = store().await;
  let id = seeded_ward(&s).await;

  let state = PresenceState::new(id, 37.50, 127.00, t0());
  s.put_presence(&state).await.unwrap();

  let fetched = s.get_presence(id).await.unwrap().unwrap();
  assert!(!fetched.is_outside);
  assert_eq!(fetched.last_alert_at, t0());
  assert_eq!(fetched.alert_interval_secs, 10);
  assert_eq!(fetched.last_latitude, 37.50);
}

#[tokio::test]
async fn put_presence_is_an_upsert() {
  let s = store().await;
  let id = seeded_ward(&s).await;

  let mut state = PresenceState::new(id, 37.50, 127.00, t0());
  s.put_presence(&state).await.unwrap();

  state.is_outside = true;
  state.last_latitude = 37.501;
  s.put_presence(&state).await.unwrap();

  let fetched = s.get_presence(id).await.unwrap().unwrap();
  assert!(fetched.is_outside);
  assert_eq!(fetched.last_latitude, 37.501);
}

#[tokio::test]
async fn list_outside_filters_by_flag() {
  let s = store().await;
  let home = seeded_ward(&s).await;
  let away = seeded_ward(&s).await;

  s.put_presence(&PresenceState::new(home, 37.50, 127.00, t0()))
    .await
    .unwrap();

  let mut outside = PresenceState::new(away, 37.501, 127.00, t0());
  outside.is_outside = true;
  s.put_presence(&outside).await.unwrap();

  let listed = s.list_outside().await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].ward_id, away);
}

// ─── Missing case registry ───────────────────────────────────────────────────

#[tokio::test]
async fn open_case_then_duplicate_is_rejected() {
  let s = store().await;
  let id = seeded_ward(&s).await;

  let first = s.open_case(new_case(id, t0())).await.unwrap();
  let OpenOutcome::Opened(case) = first else {
    panic!("first open should succeed");
  };
  assert_eq!(case.status, CaseStatus::Missing);

  let second = s.open_case(new_case(id, t0() + TimeDelta::seconds(300))).await.unwrap();
  let OpenOutcome::AlreadyOpen(existing) = second else {
    panic!("second open should be rejected");
  };
  assert_eq!(existing, case.case_id);
}

#[tokio::test]
async fn found_case_does_not_block_reopening() {
  let s = store().await;
  let id = seeded_ward(&s).await;

  let OpenOutcome::Opened(case) = s.open_case(new_case(id, t0())).await.unwrap() else {
    panic!("open failed");
  };

  let closed = s.mark_found(case.case_id, None, None, None).await.unwrap();
  assert!(matches!(closed, CaseUpdateOutcome::Updated(_)));

  let reopened = s.open_case(new_case(id, t0() + TimeDelta::hours(2))).await.unwrap();
  let OpenOutcome::Opened(second) = reopened else {
    panic!("reopening after FOUND should succeed");
  };
  assert_ne!(second.case_id, case.case_id);
}

#[tokio::test]
async fn mark_found_keeps_position_and_notes_unless_supplied() {
  let s = store().await;
  let id = seeded_ward(&s).await;

  let OpenOutcome::Opened(case) = s.open_case(new_case(id, t0())).await.unwrap() else {
    panic!("open failed");
  };

  let outcome = s
    .mark_found(case.case_id, Some(37.49), None, None)
    .await
    .unwrap();
  let CaseUpdateOutcome::Updated(found) = outcome else {
    panic!("mark_found failed");
  };
  assert_eq!(found.status, CaseStatus::Found);
  assert_eq!(found.last_latitude, Some(37.49));
  // lng and notes untouched
  assert_eq!(found.last_longitude, Some(127.00));
  assert_eq!(found.notes, "no movement for 1h");
}

#[tokio::test]
async fn mark_found_unknown_case_is_not_found() {
  let s = store().await;
  let outcome = s.mark_found(Uuid::new_v4(), None, None, None).await.unwrap();
  assert!(matches!(outcome, CaseUpdateOutcome::NotFound));
}

#[tokio::test]
async fn mark_found_twice_is_already_found() {
  let s = store().await;
  let id = seeded_ward(&s).await;

  let OpenOutcome::Opened(case) = s.open_case(new_case(id, t0())).await.unwrap() else {
    panic!("open failed");
  };
  s.mark_found(case.case_id, None, None, None).await.unwrap();

  let outcome = s.mark_found(case.case_id, None, None, None).await.unwrap();
  assert!(matches!(outcome, CaseUpdateOutcome::AlreadyFound));
}

#[tokio::test]
async fn update_case_position_only_while_missing() {
  let s = store().await;
  let id = seeded_ward(&s).await;

  let OpenOutcome::Opened(case) = s.open_case(new_case(id, t0())).await.unwrap() else {
    panic!("open failed");
  };

  let outcome = s.update_case_position(case.case_id, 37.52, 127.03).await.unwrap();
  let CaseUpdateOutcome::Updated(updated) = outcome else {
    panic!("position update failed");
  };
  assert_eq!(updated.last_latitude, Some(37.52));

  s.mark_found(case.case_id, None, None, None).await.unwrap();
  let after = s.update_case_position(case.case_id, 37.53, 127.04).await.unwrap();
  assert!(matches!(after, CaseUpdateOutcome::AlreadyFound));
}

#[tokio::test]
async fn list_cases_filters_by_status_and_orders_by_detection() {
  let s = store().await;
  let a = seeded_ward(&s).await;
  let b = seeded_ward(&s).await;

  let OpenOutcome::Opened(older) = s.open_case(new_case(a, t0())).await.unwrap() else {
    panic!("open failed");
  };
  s.mark_found(older.case_id, None, None, None).await.unwrap();

  let OpenOutcome::Opened(newer) =
    s.open_case(new_case(b, t0() + TimeDelta::hours(1))).await.unwrap()
  else {
    panic!("open failed");
  };

  let missing = s
    .list_cases(&CaseQuery { status: Some(CaseStatus::Missing), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(missing.len(), 1);
  assert_eq!(missing[0].case_id, newer.case_id);

  let all = s.list_cases(&CaseQuery::default()).await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0].case_id, newer.case_id, "newest detection first");
}
