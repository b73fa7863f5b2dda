//! Audio error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Audio config error: {0}")]
    ConfigError(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Failed to load {path}: {reason}")]
    LoadError { path: String, reason: String },

    #[error("Invalid kit config: {0}")]
    InvalidConfig(String),
}

pub type AudioResult<T> = Result<T, AudioError>;
