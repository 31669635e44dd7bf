//! Production alert sink: forwards events to the tracing pipeline, where the
//! push/SMS relay (outside this engine) picks them up.

use vigil_core::alert::{AlertEvent, AlertSink};

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AlertSink for TracingSink {
  fn deliver(&self, event: &AlertEvent) {
    tracing::info!(
      kind = ?event.kind,
      ward_id = %event.ward_id,
      at = %event.at,
      "{}",
      event.message,
    );
  }
}
