//! Engine error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Capture error: {0}")]
    Capture(String),

    #[error("No frames found in {0}")]
    EmptySequence(String),

    #[error("Invalid engine config: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] ad_core::CoreError),

    #[error(transparent)]
    Tracking(#[from] ad_tracking::TrackingError),
}

pub type EngineResult<T> = Result<T, EngineError>;
