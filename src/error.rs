//! Error types for mp-retarget
//!
//! Only the load boundaries (configuration, landmark sequences) can fail.
//! The per-tick path degrades gracefully and never returns an error.

use thiserror::Error;

/// Main error type for mp-retarget
#[derive(Error, Debug)]
pub enum RetargetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Landmark sequence loading errors
#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("Failed to parse landmark JSON: {0}")]
    Parse(String),

    #[error("Landmark sequence contains no frames")]
    Empty,

    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f32),
}

/// Result type alias for mp-retarget operations
pub type Result<T> = std::result::Result<T, RetargetError>;
