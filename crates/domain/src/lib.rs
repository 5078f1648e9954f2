//! LifeLink dispatch domain
//!
//! Domain records for the dispatch pipeline: field units, emergency
//! incidents, the state machines that govern both, and the event type
//! every lifecycle transition emits.
//!
//! This crate holds data and rules only. Registries, locking, and the
//! assignment algorithm live upstream; records here validate their own
//! transitions and nothing else, so the rules are testable without any
//! concurrency scaffolding.

#![warn(missing_docs)]

pub mod emergency;
pub mod error;
pub mod event;
pub mod unit;

// Re-export key types for convenience
pub use emergency::{Emergency, EmergencyStatus, IncidentDetails, Priority};
pub use error::TransitionError;
pub use event::DispatchEvent;
pub use unit::{LocationReport, TrackPoint, Unit, UnitStatus};
