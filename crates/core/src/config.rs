//! Configuration management for LifeLink dispatch.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, CoreResult};

/// Top-level dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub assignment: AssignmentConfig,
    pub tracking: TrackingConfig,
    pub feed: FeedConfig,
}

/// Tuning for the assignment algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentConfig {
    /// Assumed average speed for critical-priority responses, km/h.
    pub critical_speed_kmh: f64,
    /// Assumed average speed for all other priorities, km/h.
    pub standard_speed_kmh: f64,
    /// How many times a dispatch decision is retried after losing a
    /// candidate to a concurrent claim before giving up.
    pub max_assign_retries: u32,
}

/// Tuning for unit location tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Location reports retained per unit for the breadcrumb trail.
    pub location_history_depth: usize,
}

/// Tuning for the dispatch event feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Recent events kept for poll-based consumers.
    pub recent_capacity: usize,
    /// Broadcast channel capacity for push subscribers.
    pub channel_capacity: usize,
}

impl DispatchConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DispatchConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults matching the upstream dispatch contract
    /// (80 km/h critical, 60 km/h otherwise).
    pub fn default_config() -> Self {
        Self {
            assignment: AssignmentConfig {
                critical_speed_kmh: 80.0,
                standard_speed_kmh: 60.0,
                max_assign_retries: 3,
            },
            tracking: TrackingConfig {
                location_history_depth: 50,
            },
            feed: FeedConfig {
                recent_capacity: 100,
                channel_capacity: 1000,
            },
        }
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.assignment.critical_speed_kmh <= 0.0 || self.assignment.standard_speed_kmh <= 0.0 {
            return Err(CoreError::InvalidConfig(
                "assignment speeds must be positive".to_string(),
            ));
        }
        if self.assignment.max_assign_retries == 0 {
            return Err(CoreError::InvalidConfig(
                "max_assign_retries must be at least 1".to_string(),
            ));
        }
        if self.feed.channel_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "feed channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::default_config()
    }
}
