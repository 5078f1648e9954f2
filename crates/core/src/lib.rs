//! Core functionality for the LifeLink dispatch coordination system.
//!
//! This crate provides the fundamental utilities used across the LifeLink
//! ecosystem: configuration loading, structured logging initialization,
//! timestamp helpers, emergency id generation, and the append-only audit
//! journal.

pub mod clock;
pub mod config;
pub mod error;
pub mod ids;
pub mod journal;
pub mod logging;

pub use clock::now_ms;
pub use config::{AssignmentConfig, DispatchConfig, FeedConfig, TrackingConfig};
pub use error::{CoreError, CoreResult};
pub use ids::new_emergency_id;
pub use journal::{EventJournal, JournalError, JournalRecord};
