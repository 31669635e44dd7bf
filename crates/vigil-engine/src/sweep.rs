//! The stillness sweep — the periodic scan behind the system's core safety
//! property: a ward who leaves the geofence and then stops moving for longer
//! than the threshold is flagged within one sweep period, as long as
//! location reports keep arriving.

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use vigil_core::{Error, store::PresenceStore};

use crate::engine::Engine;

/// Periodic single-flight scan over wards currently outside the geofence.
pub struct StillnessSweep<S> {
  engine: Engine<S>,
}

impl<S: PresenceStore> StillnessSweep<S> {
  pub fn new(engine: Engine<S>) -> Self { Self { engine } }

  /// Run the sweep until `shutdown` flips to `true` (or its sender drops).
  ///
  /// Ticks are processed one at a time on this task; a sweep that outlasts
  /// its period simply skips the missed ticks, so sweeps never overlap.
  pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(self.engine.config().sweep_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
      period_secs = self.engine.config().sweep_period.as_secs(),
      threshold_secs = self.engine.config().stillness_threshold_secs,
      "stillness sweep started",
    );

    loop {
      tokio::select! {
        _ = ticker.tick() => {
          self.sweep_once(Utc::now()).await;
        }
        changed = shutdown.changed() => {
          if changed.is_err() || *shutdown.borrow() {
            break;
          }
        }
      }
    }

    tracing::info!("stillness sweep stopped");
  }

  /// One sweep pass at `now`. Returns how many cases were opened.
  ///
  /// A failure on one ward is isolated: it is logged and the sweep moves on
  /// to the rest. Zero wards outside is a normal, quiet pass.
  pub async fn sweep_once(&self, now: DateTime<Utc>) -> usize {
    let outside = match self.engine.store().list_outside().await {
      Ok(states) => states,
      Err(e) => {
        tracing::warn!(error = %e, "stillness sweep could not list outside wards");
        return 0;
      }
    };

    let threshold = TimeDelta::seconds(self.engine.config().stillness_threshold_secs);
    let mut opened = 0;

    for presence in outside {
      let still_for = now - presence.last_moved_at;
      if still_for < threshold {
        continue;
      }

      let note = format!(
        "no movement since {}",
        presence.last_moved_at.to_rfc3339()
      );
      let position = Some((presence.last_latitude, presence.last_longitude));

      match self
        .engine
        .open_missing_case(presence.ward_id, position, Some(note), now)
        .await
      {
        Ok(case) => {
          tracing::info!(
            ward_id = %presence.ward_id,
            case_id = %case.case_id,
            still_secs = still_for.num_seconds(),
            "opened missing case",
          );
          opened += 1;
        }
        Err(Error::CaseAlreadyOpen { case_id, .. }) => {
          tracing::debug!(
            ward_id = %presence.ward_id,
            %case_id,
            "missing case already open, skipping",
          );
        }
        Err(e) => {
          tracing::warn!(
            ward_id = %presence.ward_id,
            error = %e,
            "failed to open missing case",
          );
        }
      }
    }

    opened
  }
}
