//! Error types for pose estimation

use ad_tracking::TrackingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoseError {
    /// Model file not found
    #[error("Model not found: {path}")]
    ModelNotFound { path: String },

    /// Tract failed to load, optimize or run the model
    #[error("Tract error: {0}")]
    TractError(String),

    /// Output tensor does not look like MoveNet keypoints
    #[error("Invalid output shape: expected {expected}, got {got}")]
    InvalidOutputShape { expected: String, got: String },

    #[error("Invalid pose config: {0}")]
    InvalidConfig(String),
}

pub type PoseResult<T> = Result<T, PoseError>;

impl From<PoseError> for TrackingError {
    fn from(err: PoseError) -> Self {
        TrackingError::Detection(err.to_string())
    }
}
