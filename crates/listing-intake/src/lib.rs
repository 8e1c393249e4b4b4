//! Guided intake for rental property records.
//!
//! The `intake` module carries the wizard engine: an ordered step catalog,
//! fail-soft validation with per-field error maps, per-category completion
//! tracking, and the sensitive-field policy every outbound representation
//! must pass through. Persistence and identity stay behind the collaborator
//! traits in [`intake::store`] so the engine can be exercised in isolation.

pub mod config;
pub mod error;
pub mod intake;
pub mod telemetry;
