//! The alert boundary — where presence transitions leave the engine.
//!
//! Downstream push/SMS channels consume [`AlertEvent`]s through an
//! [`AlertSink`]. Delivery is best-effort and never rolls back the state
//! transition that produced the event; presence state is the source of truth.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::presence::AlertKind;

/// One emitted alert: a qualifying presence transition or a missing
/// detection, with the position that triggered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
  pub kind:      AlertKind,
  pub ward_id:   Uuid,
  pub at:        DateTime<Utc>,
  pub latitude:  f64,
  pub longitude: f64,
  /// Human-readable guardian notification, e.g. "Alice left home".
  pub message:   String,
}

/// Notification boundary. Implementations must not block and must not fail
/// the caller: a delivery problem is the sink's to log, not the engine's.
pub trait AlertSink: Send + Sync {
  fn deliver(&self, event: &AlertEvent);
}

/// Records every delivered event. The stub used across the workspace's
/// tests to assert on emitted alerts; the production sink lives with the
/// engine, next to the tracing pipeline.
#[derive(Debug, Default)]
pub struct RecordingSink {
  events: Mutex<Vec<AlertEvent>>,
}

impl RecordingSink {
  pub fn new() -> Self { Self::default() }

  /// Snapshot of everything delivered so far, in order.
  pub fn events(&self) -> Vec<AlertEvent> {
    self.events.lock().expect("sink poisoned").clone()
  }

  /// Kinds only — convenient for asserting alert sequences.
  pub fn kinds(&self) -> Vec<AlertKind> {
    self.events().iter().map(|e| e.kind).collect()
  }
}

impl AlertSink for RecordingSink {
  fn deliver(&self, event: &AlertEvent) {
    self.events.lock().expect("sink poisoned").push(event.clone());
  }
}
