//! Tracking error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Invalid tracker config: {0}")]
    InvalidConfig(String),

    #[error("Pose detection failed: {0}")]
    Detection(String),
}

pub type TrackingResult<T> = Result<T, TrackingError>;
