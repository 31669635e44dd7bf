//! SSE subscription endpoint for the broadcast hub.
//!
//! `GET /subscribe/:observer_id` opens a server-sent-events stream. The
//! stream begins with a snapshot of every reporting ward's latest position,
//! then carries live location updates and alerts as they happen. Closing the
//! connection drops the receiver; the hub prunes the dead subscriber on its
//! next publish.

use axum::{
  extract::{Path, State},
  response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{Stream, StreamExt, wrappers::UnboundedReceiverStream};
use uuid::Uuid;
use vigil_core::store::PresenceStore;
use vigil_engine::Engine;

use crate::error::ApiError;

/// `GET /subscribe/:observer_id`
pub async fn handler<S>(
  State(engine): State<Engine<S>>,
  Path(observer_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError>
where
  S: PresenceStore + 'static,
{
  let rx = engine.subscribe(observer_id).await?;
  let stream =
    UnboundedReceiverStream::new(rx).map(|event| Event::default().json_data(&event));
  Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
