//! Core error types

use thiserror::Error;

/// Core error type for LifeLink
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration value is out of range or inconsistent
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
