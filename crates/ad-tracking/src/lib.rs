//! ad-tracking: Limb tracking for AirDrums
//!
//! Turns raw elbow/wrist landmarks into a projected stick tip and a zone:
//!
//! ```text
//! elbow, wrist ──▶ raw tip ──▶ Predictor ──▶ clamp ──▶ ZoneMap ──▶ Zone
//!  (normalized)    (pixels)   (linear or        (frame)
//!                              alpha-beta)
//! ```
//!
//! The pose estimator itself is a collaborator behind [`PoseDetector`].

mod error;
mod landmarks;
mod predictor;
mod tracker;

pub use error::*;
pub use landmarks::*;
pub use predictor::*;
pub use tracker::*;
