//! ad-pose: Pose estimation backend for AirDrums
//!
//! Runs a single-person MoveNet model through tract (pure Rust ONNX) and
//! reports the four joints the tracker consumes.

mod error;
mod keypoints;
mod movenet;

pub use error::*;
pub use keypoints::*;
pub use movenet::*;
