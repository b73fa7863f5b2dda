//! ad-audio: Drum sample playback for AirDrums
//!
//! - `sample`: WAV loading into interleaved f32
//! - `mixer`: cpal output with a fixed pool of one-shot voices
//! - `dispatcher`: drum voice -> preloaded sample -> fire-and-forget play

mod dispatcher;
mod error;
mod mixer;
mod sample;

pub use dispatcher::*;
pub use error::*;
pub use mixer::*;
pub use sample::*;
