//! LifeLink registries
//!
//! In-memory books of record for the dispatch pipeline: the unit roster,
//! the emergency log, and the [`DispatchBoard`] that binds the two under
//! one lock so compound dispatch commits are atomic and readers never see
//! a half-applied assignment.
//!
//! The registries themselves are plain single-threaded structures; all
//! locking lives in the board. This keeps every business rule testable
//! without a runtime, and it keeps the lock discipline in exactly one
//! place.

#![warn(missing_docs)]

pub mod board;
pub mod emergencies;
pub mod error;
pub mod units;

// Re-export key types for convenience
pub use board::{BoardState, DispatchBoard};
pub use emergencies::EmergencyStore;
pub use error::RegistryError;
pub use units::UnitRegistry;
