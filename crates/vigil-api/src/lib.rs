//! JSON REST API for Vigil.
//!
//! Exposes an axum [`Router`] backed by an [`Engine`] over any
//! [`vigil_core::store::PresenceStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", vigil_api::api_router(engine.clone()))
//! ```

pub mod cases;
pub mod error;
pub mod location;
pub mod subscribe;
pub mod wards;

use axum::{
  Router,
  routing::{get, post, put},
};
use vigil_core::store::PresenceStore;
use vigil_engine::Engine;

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Engine<S>) -> Router<()>
where
  S: PresenceStore + 'static,
{
  Router::new()
    // Wards
    .route("/wards/{id}", put(wards::sync::<S>))
    .route("/wards/{id}/home", post(wards::register_home::<S>))
    // Location
    .route("/location", post(location::report::<S>).get(location::latest_all::<S>))
    .route("/location/{ward_id}", get(location::latest_one::<S>))
    // Cases
    .route("/cases", post(cases::open::<S>).get(cases::list::<S>))
    .route("/cases/{id}", get(cases::get_one::<S>))
    .route("/cases/{id}/found", put(cases::mark_found::<S>))
    .route("/cases/{id}/location", put(cases::update_position::<S>))
    // Broadcast
    .route("/subscribe/{observer_id}", get(subscribe::handler::<S>))
    .with_state(engine)
}

// ─── Integration tests ────────────────────────────────────────────────────────
