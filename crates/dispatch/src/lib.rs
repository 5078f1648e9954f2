//! LifeLink Dispatch
//!
//! The coordination core of the dispatch pipeline.
//!
//! This crate provides:
//! - Nearest-unit assignment with claim re-validation under contention
//! - Assignment lifecycle handling (acknowledge, arrive, complete, decline, cancel)
//! - The live dispatch event feed (broadcast fan-out plus a bounded replay ring)

#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod feed;
pub mod lifecycle;

// Re-export key types for convenience
pub use engine::{nearest_available, Assignment, DispatchEngine, DispatchOutcome, EmergencyRequest};
pub use error::DispatchError;
pub use feed::DispatchFeed;
pub use lifecycle::LifecycleCoordinator;
