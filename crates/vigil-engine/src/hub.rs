//! Broadcast fan-out of location updates and alerts to guardian observers.
//!
//! The hub only manages subscription membership and fan-out; the transport
//! (SSE, push channel) belongs to the caller holding the receiver. Delivery
//! is best-effort and at-most-once per subscriber per event — there is no
//! replay buffer. A slow or disconnected subscriber never blocks the report
//! or sweep path: sends are non-blocking and dead subscribers are dropped.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;
use vigil_core::{alert::AlertEvent, location::Position};

/// One message fanned out to every current subscriber.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HubEvent {
  Location {
    ward_id:      Uuid,
    position:     Position,
    display_name: Option<String>,
  },
  Alert(AlertEvent),
}

/// Subscriber registry keyed by observer id. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct BroadcastHub {
  subscribers: Arc<Mutex<HashMap<Uuid, UnboundedSender<HubEvent>>>>,
}

impl BroadcastHub {
  pub fn new() -> Self { Self::default() }

  /// Register `observer_id` and return its event stream. A snapshot of the
  /// given latest positions is queued first, so a newly joined observer sees
  /// every currently-known ward before live updates. Re-subscribing replaces
  /// any previous session for the same observer.
  pub fn subscribe(
    &self,
    observer_id: Uuid,
    snapshot: Vec<(Uuid, Position)>,
  ) -> UnboundedReceiver<HubEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    for (ward_id, position) in snapshot {
      // Cannot fail: we still hold the receiver.
      let _ = tx.send(HubEvent::Location { ward_id, position, display_name: None });
    }
    let previous = self
      .subscribers
      .lock()
      .expect("hub poisoned")
      .insert(observer_id, tx);
    if previous.is_some() {
      tracing::debug!(%observer_id, "replaced existing hub subscription");
    }
    rx
  }

  pub fn unsubscribe(&self, observer_id: Uuid) {
    self
      .subscribers
      .lock()
      .expect("hub poisoned")
      .remove(&observer_id);
  }

  pub fn publish_location(
    &self,
    ward_id: Uuid,
    position: Position,
    display_name: Option<String>,
  ) {
    self.publish(HubEvent::Location { ward_id, position, display_name });
  }

  pub fn publish_alert(&self, event: &AlertEvent) {
    self.publish(HubEvent::Alert(event.clone()));
  }

  /// Fan `event` out to all current subscribers. Subscribers whose receiver
  /// has gone away are removed; the failure is logged, never propagated.
  fn publish(&self, event: HubEvent) {
    let mut subscribers = self.subscribers.lock().expect("hub poisoned");
    subscribers.retain(|observer_id, tx| {
      if tx.send(event.clone()).is_err() {
        tracing::debug!(%observer_id, "dropping disconnected hub subscriber");
        false
      } else {
        true
      }
    });
  }

  pub fn subscriber_count(&self) -> usize {
    self.subscribers.lock().expect("hub poisoned").len()
  }
}
