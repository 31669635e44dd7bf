//! Error types for `vigil-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// The reported ward has no geofence snapshot. The engine refuses to
  /// create presence state for a ward the account system does not know.
  #[error("ward not found: {0}")]
  WardNotFound(Uuid),

  #[error("invalid coordinates: lat {lat}, lng {lng}")]
  InvalidCoordinates { lat: f64, lng: f64 },

  #[error("missing case not found: {0}")]
  CaseNotFound(Uuid),

  /// A `Missing` case is already open for this ward. An expected idempotent
  /// outcome of the dedup guarantee, not a system failure.
  #[error("ward {ward_id} already has open case {case_id}")]
  CaseAlreadyOpen { ward_id: Uuid, case_id: Uuid },

  #[error("case {0} is already marked found")]
  CaseAlreadyFound(Uuid),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Wrap a backend error from a [`crate::store::PresenceStore`] impl.
  pub fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
