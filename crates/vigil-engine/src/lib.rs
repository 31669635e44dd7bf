//! The Vigil presence & missing-detection engine.
//!
//! Orchestrates the core subsystem over any [`vigil_core::store::PresenceStore`]:
//! location ingestion and geofence evaluation, alert emission through an
//! [`vigil_core::alert::AlertSink`], broadcast fan-out to guardian observers,
//! and the periodic stillness sweep that opens missing-person cases.

mod engine;
pub mod hub;
pub mod sink;
pub mod sweep;

pub use engine::{Engine, EngineConfig, Report};
pub use hub::{BroadcastHub, HubEvent};
pub use sweep::StillnessSweep;
