//! Error types for AirDrums core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unknown drum label: {0}")]
    UnknownLabel(String),
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
